//! Disk cache contract shared between the core and the media engine.
//!
//! The core decides whether a source is cacheable and attaches the cache to
//! the [`EngineSource`](crate::engine::EngineSource); the engine reads through
//! it while fetching. Keys are source URIs; implementations map them to
//! storage names themselves.

use crate::{error::Result, platform::PlatformSendSync};
use bytes::Bytes;
use std::fmt;

pub trait MediaCache: PlatformSendSync + fmt::Debug {
    /// Identifier namespacing this cache on disk.
    fn identifier(&self) -> &str;

    /// Read the cached bytes for `uri`, marking the entry as recently used.
    fn read(&self, uri: &str) -> Result<Option<Bytes>>;

    /// Store `data` for `uri`, evicting older entries to stay under the size limit.
    fn write(&self, uri: &str, data: Bytes) -> Result<()>;

    fn contains(&self, uri: &str) -> bool;

    /// Drop the entry for `uri`. Returns `true` if something was removed.
    fn remove(&self, uri: &str) -> Result<bool>;

    /// Bytes currently stored.
    fn size_bytes(&self) -> u64;
}
