//! LRU disk cache
//!
//! Entries are files in `<directory>/<identifier>`, named by the SHA-256 hex
//! digest of the source URI. An in-memory [`LruCache`] index tracks access
//! order and sizes; files are evicted least-recently-used first until the
//! total fits the configured maximum.

use crate::cache::config::CacheConfig;
use crate::cache::stats::CacheStats;
use crate::error::{PlaybackError, Result};
use bridge_traits::cache::MediaCache;
use bridge_traits::error::Result as BridgeResult;
use bytes::Bytes;
use core_runtime::logging::strip_path;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const TEMP_SUFFIX: &str = ".part";

struct CacheIndex {
    /// key -> file size in bytes
    entries: LruCache<String, u64>,
    total_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

pub struct SimpleCache {
    identifier: String,
    directory: PathBuf,
    max_size_bytes: u64,
    index: Mutex<CacheIndex>,
}

impl SimpleCache {
    /// Open (or create) the cache directory described by `config` and index
    /// the files already in it, oldest first.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        config.validate().map_err(PlaybackError::Config)?;
        let max_size_bytes = match config.max_cache_size_bytes {
            Some(size) if size > 0 => size,
            _ => {
                return Err(PlaybackError::Config(
                    "max_cache_size_bytes must be greater than 0".to_string(),
                ))
            }
        };

        let directory = config.cache_path();
        fs::create_dir_all(&directory).map_err(|e| {
            PlaybackError::CacheError(format!(
                "Failed to create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        let cache = Self {
            identifier: config.identifier.clone(),
            directory,
            max_size_bytes,
            index: Mutex::new(CacheIndex {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        };
        cache.restore_index()?;

        info!(
            identifier = %cache.identifier,
            entries = cache.index.lock().entries.len(),
            max_size_bytes,
            "Opened media cache"
        );
        Ok(cache)
    }

    /// Storage key for `uri`.
    pub fn key_for(uri: &str) -> String {
        hex::encode(Sha256::digest(uri.as_bytes()))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn len(&self) -> usize {
        self.index.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let index = self.index.lock();
        CacheStats {
            entries: index.entries.len(),
            total_bytes: index.total_bytes,
            max_bytes: self.max_size_bytes,
            hits: index.hits,
            misses: index.misses,
            evictions: index.evictions,
        }
    }

    /// Delete every cached file.
    pub fn clear(&self) -> Result<()> {
        let mut index = self.index.lock();
        while let Some((key, _)) = index.entries.pop_lru() {
            remove_file_if_exists(&self.directory.join(&key))?;
        }
        index.total_bytes = 0;
        info!(identifier = %self.identifier, "Cleared media cache");
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }

    fn restore_index(&self) -> Result<()> {
        let mut found: Vec<(SystemTime, String, u64)> = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                // Interrupted write
                remove_file_if_exists(&entry.path())?;
                continue;
            }
            let touched = metadata
                .accessed()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((touched, name, metadata.len()));
        }
        found.sort();

        let mut index = self.index.lock();
        for (_, key, size) in found {
            index.total_bytes += size;
            index.entries.push(key, size);
        }
        self.evict_to_fit(&mut index, 0)
    }

    /// Evict LRU entries until `incoming` more bytes fit.
    fn evict_to_fit(&self, index: &mut CacheIndex, incoming: u64) -> Result<()> {
        while index.total_bytes + incoming > self.max_size_bytes {
            let Some((key, size)) = index.entries.pop_lru() else {
                break;
            };
            remove_file_if_exists(&self.path_for(&key))?;
            index.total_bytes = index.total_bytes.saturating_sub(size);
            index.evictions += 1;
            debug!(key = %key, size, "Evicted cache entry");
        }
        Ok(())
    }
}

impl MediaCache for SimpleCache {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn read(&self, uri: &str) -> BridgeResult<Option<Bytes>> {
        let key = Self::key_for(uri);
        let mut index = self.index.lock();
        if index.entries.get(&key).is_none() {
            index.misses += 1;
            return Ok(None);
        }

        match fs::read(self.path_for(&key)) {
            Ok(data) => {
                index.hits += 1;
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Deleted behind our back
                if let Some(size) = index.entries.pop(&key) {
                    index.total_bytes = index.total_bytes.saturating_sub(size);
                }
                index.misses += 1;
                warn!(file = %strip_path(&key), "Cached file vanished");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, uri: &str, data: Bytes) -> BridgeResult<()> {
        let size = data.len() as u64;
        if size > self.max_size_bytes {
            debug!(size, max = self.max_size_bytes, "Entry larger than cache, not stored");
            return Ok(());
        }

        let key = Self::key_for(uri);
        let mut index = self.index.lock();
        if let Some(old) = index.entries.pop(&key) {
            index.total_bytes = index.total_bytes.saturating_sub(old);
        }
        self.evict_to_fit(&mut index, size)
            .map_err(|e| io::Error::other(e.to_string()))?;

        let path = self.path_for(&key);
        let temp = self.directory.join(format!("{}{}", key, TEMP_SUFFIX));
        if let Err(e) = fs::write(&temp, &data).and_then(|()| fs::rename(&temp, &path)) {
            // The previous entry is already out of the index; its file must go too.
            for stale in [&temp, &path] {
                if let Err(cleanup) = remove_file_if_exists(stale) {
                    warn!(error = %cleanup, "Failed to remove partial cache file");
                }
            }
            return Err(e.into());
        }

        index.entries.push(key, size);
        index.total_bytes += size;
        Ok(())
    }

    fn contains(&self, uri: &str) -> bool {
        self.index.lock().entries.contains(&Self::key_for(uri))
    }

    fn remove(&self, uri: &str) -> BridgeResult<bool> {
        let key = Self::key_for(uri);
        let mut index = self.index.lock();
        match index.entries.pop(&key) {
            Some(size) => {
                index.total_bytes = index.total_bytes.saturating_sub(size);
                remove_file_if_exists(&self.path_for(&key))
                    .map_err(|e| io::Error::other(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn size_bytes(&self) -> u64 {
        self.index.lock().total_bytes
    }
}

impl std::fmt::Debug for SimpleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCache")
            .field("identifier", &self.identifier)
            .field("directory", &self.directory)
            .field("max_size_bytes", &self.max_size_bytes)
            .finish()
    }
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &Path, max: u64) -> SimpleCache {
        SimpleCache::open(
            &CacheConfig::new("unit")
                .with_directory(dir)
                .with_max_size(max),
        )
        .unwrap()
    }

    #[test]
    fn test_key_is_sha256_hex() {
        let key = SimpleCache::key_for("https://cdn.example/a.mp3");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, SimpleCache::key_for("https://cdn.example/b.mp3"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 1024);

        cache.write("a", Bytes::from_static(b"hello")).unwrap();
        assert!(cache.contains("a"));
        assert_eq!(cache.read("a").unwrap().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(cache.read("b").unwrap(), None);
        assert_eq!(cache.size_bytes(), 5);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction_respects_access_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 10);

        cache.write("a", Bytes::from(vec![0u8; 4])).unwrap();
        cache.write("b", Bytes::from(vec![0u8; 4])).unwrap();
        // Touch "a" so "b" becomes least recently used.
        cache.read("a").unwrap();
        cache.write("c", Bytes::from(vec![0u8; 4])).unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.size_bytes(), 8);
        assert_eq!(cache.stats().evictions, 1);
        assert!(!dir.path().join("unit").join(SimpleCache::key_for("b")).exists());
    }

    #[test]
    fn test_oversized_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 4);
        cache.write("big", Bytes::from(vec![1u8; 5])).unwrap();
        assert!(!cache.contains("big"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_rewrite_replaces_size() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 100);
        cache.write("a", Bytes::from(vec![0u8; 10])).unwrap();
        cache.write("a", Bytes::from(vec![0u8; 3])).unwrap();
        assert_eq!(cache.size_bytes(), 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 100);
        cache.write("a", Bytes::from_static(b"1")).unwrap();
        cache.write("b", Bytes::from_static(b"22")).unwrap();

        assert!(cache.remove("a").unwrap());
        assert!(!cache.remove("a").unwrap());
        assert_eq!(cache.size_bytes(), 2);

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
        assert_eq!(fs::read_dir(cache.directory()).unwrap().count(), 0);
    }

    #[test]
    fn test_reopen_restores_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = open(dir.path(), 100);
            cache.write("a", Bytes::from_static(b"abc")).unwrap();
        }
        fs::write(dir.path().join("unit").join("stale.part"), b"x").unwrap();

        let reopened = open(dir.path(), 100);
        assert!(reopened.contains("a"));
        assert_eq!(reopened.size_bytes(), 3);
        assert!(!dir.path().join("unit").join("stale.part").exists());
    }

    #[test]
    fn test_reopen_with_smaller_limit_evicts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = open(dir.path(), 100);
            cache.write("a", Bytes::from(vec![0u8; 40])).unwrap();
            cache.write("b", Bytes::from(vec![0u8; 40])).unwrap();
        }
        let reopened = open(dir.path(), 50);
        assert_eq!(reopened.len(), 1);
        assert!(reopened.size_bytes() <= 50);
    }

    #[test]
    fn test_failed_overwrite_drops_stale_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path(), 1024);
        cache.write("a", Bytes::from_static(b"old")).unwrap();

        let key = SimpleCache::key_for("a");
        let blocker = cache.directory.join(format!("{}{}", key, TEMP_SUFFIX));
        fs::create_dir(&blocker).unwrap();

        assert!(cache.write("a", Bytes::from_static(b"new")).is_err());
        assert!(!cache.contains("a"));
        assert!(!cache.path_for(&key).exists());
        assert_eq!(cache.size_bytes(), 0);
    }
}
