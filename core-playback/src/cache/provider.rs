//! Process-wide registry of disk caches
//!
//! Two players configured with the same identifier share one
//! [`SimpleCache`]; opening the same directory twice would corrupt the LRU
//! bookkeeping.

use crate::cache::config::CacheConfig;
use crate::cache::simple::SimpleCache;
use crate::error::{PlaybackError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

type Registry = RwLock<HashMap<String, Arc<SimpleCache>>>;

static CACHES: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    CACHES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Hands out one [`SimpleCache`] per identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheProvider;

impl CacheProvider {
    /// Return the cache for `config.identifier`, opening it on first use.
    ///
    /// Returns `Ok(None)` when the configuration disables caching (no size or
    /// size zero). A later call with the same identifier but different
    /// settings gets the cache that is already open.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or I/O failures creating the directory.
    pub fn get_or_create(config: &CacheConfig) -> Result<Option<Arc<SimpleCache>>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        config.validate().map_err(PlaybackError::Config)?;

        if let Some(cache) = registry().read().get(&config.identifier) {
            return Ok(Some(Arc::clone(cache)));
        }

        let mut caches = registry().write();
        // Another caller may have opened it between the two locks.
        if let Some(cache) = caches.get(&config.identifier) {
            return Ok(Some(Arc::clone(cache)));
        }

        let cache = Arc::new(SimpleCache::open(config)?);
        caches.insert(config.identifier.clone(), Arc::clone(&cache));
        info!(identifier = %config.identifier, "Registered media cache");
        Ok(Some(cache))
    }

    /// The open cache for `identifier`, if any.
    pub fn get(identifier: &str) -> Option<Arc<SimpleCache>> {
        registry().read().get(identifier).cloned()
    }

    /// Forget the cache for `identifier`. Files stay on disk; holders of the
    /// `Arc` keep a working cache until they drop it.
    pub fn release(identifier: &str) -> bool {
        let released = registry().write().remove(identifier).is_some();
        if released {
            debug!(identifier, "Released media cache");
        }
        released
    }

    pub fn active_identifiers() -> Vec<String> {
        let mut ids: Vec<String> = registry().read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
