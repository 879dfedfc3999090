//! # Playback Models
//!
//! Plain data handed to and read back from the queued player.
//!
//! An [`AudioItem`] is immutable once built: replacing a track means putting
//! a new item at a queue position, never editing one in place.

use bridge_traits::cache::MediaCache;
use bridge_traits::engine::{EngineSource, MediaType};
use core_notification::NotificationMetadata;
use core_runtime::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

pub use core_runtime::events::PlayerState;

/// URI scheme used for sources bundled with the host application.
pub const RESOURCE_SCHEME: &str = "rawresource:///";

// ============================================================================
// Repeat Mode
// ============================================================================

/// What happens when an item or the whole queue runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Stop after the last item.
    #[default]
    Off,
    /// Loop the current item.
    One,
    /// Wrap from the last item to the first.
    All,
}

impl RepeatMode {
    pub fn name(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }
}

// ============================================================================
// Audio Item
// ============================================================================

/// Per-item source options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioItemOptions {
    /// Extra HTTP request headers for remote sources.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Overrides the player's default user agent.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Identifier of a resource bundled with the host app. When set it wins
    /// over `source`.
    #[serde(default)]
    pub resource_id: Option<String>,

    /// Whether remote reads may go through the disk cache.
    #[serde(default = "default_cacheable")]
    pub cacheable: bool,
}

fn default_cacheable() -> bool {
    true
}

impl Default for AudioItemOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            user_agent: None,
            resource_id: None,
            cacheable: default_cacheable(),
        }
    }
}

/// One playable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioItem {
    source: String,
    #[serde(default)]
    media_type: MediaType,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    album_title: Option<String>,
    #[serde(default)]
    artwork: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    options: AudioItemOptions,
}

impl AudioItem {
    /// Progressive item for `source` (remote URL or local path/URI).
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_media_type(source, MediaType::Default)
    }

    pub fn with_media_type(source: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            source: source.into(),
            media_type,
            title: None,
            artist: None,
            album_title: None,
            artwork: None,
            duration_ms: None,
            options: AudioItemOptions::default(),
        }
    }

    /// Item backed by a resource bundled with the host application.
    pub fn from_resource(resource_id: impl Into<String>) -> Self {
        let resource_id = resource_id.into();
        let mut item = Self::new(format!("{}{}", RESOURCE_SCHEME, resource_id));
        item.options.resource_id = Some(resource_id);
        item
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn album_title(mut self, album: impl Into<String>) -> Self {
        self.album_title = Some(album.into());
        self
    }

    pub fn artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    /// Never read this item through the disk cache.
    pub fn uncached(mut self) -> Self {
        self.options.cacheable = false;
        self
    }

    pub fn with_options(mut self, options: AudioItemOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn get_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn get_artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    pub fn get_album_title(&self) -> Option<&str> {
        self.album_title.as_deref()
    }

    pub fn get_artwork(&self) -> Option<&str> {
        self.artwork.as_deref()
    }

    /// Nominal duration, `None` when unknown (live streams, unprobed files).
    pub fn get_duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn options(&self) -> &AudioItemOptions {
        &self.options
    }

    /// Returns `true` if the engine fetches this item over HTTP(S).
    pub fn is_remote(&self) -> bool {
        self.options.resource_id.is_none()
            && (self.source.starts_with("http://") || self.source.starts_with("https://"))
    }

    /// Source URI handed to the engine.
    pub fn uri(&self) -> String {
        match &self.options.resource_id {
            Some(id) => format!("{}{}", RESOURCE_SCHEME, id),
            None if self.source.starts_with('/') => format!("file://{}", self.source),
            None => self.source.clone(),
        }
    }

    /// Build the engine descriptor for this item.
    ///
    /// `cache` is attached only to remote, cacheable items. The item's user
    /// agent wins over `default_user_agent`.
    pub fn to_engine_source(
        &self,
        default_user_agent: Option<&str>,
        cache: Option<Arc<dyn MediaCache>>,
    ) -> EngineSource {
        let mut source = EngineSource::new(self.uri(), self.media_type);
        if self.is_remote() {
            source.headers = self.options.headers.clone();
            source.user_agent = self
                .options
                .user_agent
                .clone()
                .or_else(|| default_user_agent.map(str::to_string));
            if self.options.cacheable {
                source.cache = cache;
            }
            if !source.headers.is_empty() {
                trace!(
                    uri = %source.uri,
                    headers = %redacted_headers(&source.headers),
                    "Attaching request headers"
                );
            }
        }
        source
    }

    /// Metadata shown in the system notification for this item.
    pub fn to_notification_metadata(&self) -> NotificationMetadata {
        NotificationMetadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album_title.clone(),
            artwork: self.artwork.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Header list for log output, auth values masked. Sorted by name.
fn redacted_headers(headers: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{}={}", name, redact_if_sensitive(name, value)))
        .collect();
    pairs.sort();
    pairs.join(", ")
}
