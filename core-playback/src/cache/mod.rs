//! # Media Cache
//!
//! LRU disk cache the engine reads through for remote sources.
//!
//! ## Overview
//!
//! - [`CacheConfig`] names the cache and sets its size limit; a missing or
//!   zero size disables caching
//! - [`CacheProvider`] keeps one [`SimpleCache`] per identifier for the whole
//!   process
//! - [`SimpleCache`] implements the bridge `MediaCache` trait and is attached
//!   to every cacheable `EngineSource`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bridge_traits::cache::MediaCache;
//! use core_playback::cache::{CacheConfig, CacheProvider};
//!
//! # fn main() -> core_playback::Result<()> {
//! let config = CacheConfig::new("podcasts").with_max_size(256 * 1024 * 1024);
//! if let Some(cache) = CacheProvider::get_or_create(&config)? {
//!     println!("{} bytes cached", cache.size_bytes());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod provider;
pub mod simple;
pub mod stats;

pub use config::CacheConfig;
pub use provider::CacheProvider;
pub use simple::SimpleCache;
pub use stats::CacheStats;
