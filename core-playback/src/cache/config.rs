//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one disk cache namespace.
///
/// Caching is disabled when `max_cache_size_bytes` is `None` or `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Namespaces the cache directory; one cache instance exists per identifier.
    pub identifier: String,

    /// Maximum total size of cached files in bytes.
    pub max_cache_size_bytes: Option<u64>,

    /// Base directory; the cache lives in `<directory>/<identifier>`.
    /// Defaults to the OS cache directory, or the temp dir when there is none.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            identifier: "player".to_string(),
            max_cache_size_bytes: None,
            directory: None,
        }
    }
}

impl CacheConfig {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Set maximum cache size.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_cache_size_bytes = Some(bytes);
        self
    }

    /// Set the base directory.
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// Returns `true` if this configuration asks for a cache at all.
    pub fn is_enabled(&self) -> bool {
        matches!(self.max_cache_size_bytes, Some(size) if size > 0)
    }

    /// Directory holding this cache's files.
    pub fn cache_path(&self) -> PathBuf {
        let base = self
            .directory
            .clone()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir);
        base.join(&self.identifier)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.identifier.is_empty() {
            return Err("identifier cannot be empty".to_string());
        }

        if self
            .identifier
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
            || self.identifier == "."
            || self.identifier == ".."
        {
            return Err(format!(
                "identifier '{}' must be a single path component",
                self.identifier
            ));
        }

        if let Some(dir) = &self.directory {
            if dir.as_os_str().is_empty() {
                return Err("directory cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_cache() {
        let config = CacheConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_size_disables_cache() {
        assert!(!CacheConfig::new("podcasts").with_max_size(0).is_enabled());
        assert!(CacheConfig::new("podcasts").with_max_size(1).is_enabled());
    }

    #[test]
    fn test_cache_path_uses_identifier() {
        let config = CacheConfig::new("podcasts").with_directory("/var/cache/app");
        assert_eq!(config.cache_path(), PathBuf::from("/var/cache/app/podcasts"));
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::new("").validate().is_err());
        assert!(CacheConfig::new("a/b").validate().is_err());
        assert!(CacheConfig::new("..").validate().is_err());
        assert!(CacheConfig::new("music")
            .with_directory("")
            .validate()
            .is_err());
        assert!(CacheConfig::new("music-v2").validate().is_ok());
    }
}
