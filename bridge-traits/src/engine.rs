//! Media engine bridge trait and the types exchanged with it.
//!
//! The engine owns decoding, rendering and adaptive streaming. The core only
//! sees an ordered timeline of opaque [`EngineSource`]s, a current timeline
//! index and a handful of transport controls. Everything the engine wants to
//! tell the core arrives asynchronously as an [`EngineEvent`] through the
//! [`CallbackSender`](crate::callback::CallbackSender) installed with
//! [`MediaEngine::set_callback_sender`].

use crate::{cache::MediaCache, callback::CallbackSender, error::Result, platform::PlatformSend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Container/streaming format of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Progressive download or local file.
    #[default]
    Default,
    /// MPEG-DASH manifest.
    Dash,
    /// HTTP Live Streaming playlist.
    Hls,
    /// Microsoft Smooth Streaming manifest.
    SmoothStreaming,
}

impl MediaType {
    /// Returns `true` for manifest-based adaptive formats.
    pub fn is_adaptive(&self) -> bool {
        !matches!(self, MediaType::Default)
    }
}

/// Descriptor handed to the engine for one timeline slot.
///
/// The engine treats the descriptor as opaque once prepared; the core never
/// reads it back.
#[derive(Clone)]
pub struct EngineSource {
    /// Remote URL, `file://` URI or raw resource identifier.
    pub uri: String,
    pub media_type: MediaType,
    /// Extra HTTP request headers for remote sources.
    pub headers: HashMap<String, String>,
    pub user_agent: Option<String>,
    /// Disk cache the engine should read through, when caching is enabled.
    pub cache: Option<Arc<dyn MediaCache>>,
}

impl EngineSource {
    /// Create an uncached source without extra headers.
    pub fn new(uri: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            uri: uri.into(),
            media_type,
            headers: HashMap::new(),
            user_agent: None,
            cache: None,
        }
    }

    /// Returns `true` if the engine has to fetch this source over HTTP(S).
    pub fn is_remote(&self) -> bool {
        self.uri.starts_with("http://") || self.uri.starts_with("https://")
    }

    /// Returns `true` if reads go through a disk cache.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}

impl fmt::Debug for EngineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSource")
            .field("uri", &self.uri)
            .field("media_type", &self.media_type)
            .field("headers", &self.headers.len())
            .field("user_agent", &self.user_agent)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

/// Buffering and device-behaviour options applied once at engine setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Minimum media duration the engine tries to keep buffered.
    pub min_buffer_ms: u64,
    /// Maximum media duration the engine buffers ahead.
    pub max_buffer_ms: u64,
    /// Buffer required before playback starts or resumes after a seek.
    pub playback_buffer_ms: u64,
    /// Media kept behind the playhead for fast backwards seeks.
    pub back_buffer_ms: u64,
    /// Pause when headphones are unplugged.
    pub handle_audio_becoming_noisy: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_buffer_ms: 50_000,
            max_buffer_ms: 50_000,
            playback_buffer_ms: 2_500,
            back_buffer_ms: 0,
            handle_audio_becoming_noisy: true,
        }
    }
}

/// Coarse engine playback state as reported by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Why the engine moved its current timeline index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineTransitionReason {
    /// The previous item finished and the engine advanced on its own.
    Auto,
    /// A seek landed on another item.
    Seek,
    /// The engine looped back to the same item.
    Repeat,
    /// The timeline was mutated and the current item changed as a result.
    PlaylistChanged,
}

/// Why the engine's playback position jumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscontinuityReason {
    AutoTransition,
    Seek,
    SeekAdjustment,
    Skip,
    Remove,
    Internal,
}

/// Container format a parsed metadata frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFormat {
    Id3,
    Icy,
    VorbisComment,
    QuickTime,
}

/// Metadata the engine extracted from the media stream itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMetadata {
    pub format: Option<MetadataFormat>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub url: Option<String>,
    /// Artwork reference (URI or data URI) when embedded in the stream.
    pub artwork: Option<String>,
}

impl ParsedMetadata {
    /// Returns `true` if no displayable field was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.date.is_none()
            && self.genre.is_none()
            && self.url.is_none()
            && self.artwork.is_none()
    }
}

/// Error reported by the engine while preparing or playing a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    /// Engine-specific error code (e.g. `"ERROR_CODE_IO_NETWORK_CONNECTION_FAILED"`).
    pub code: String,
    pub message: String,
}

impl EngineError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Asynchronous callbacks emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    PlaybackStateChanged(EngineState),
    IsPlayingChanged(bool),
    MediaItemTransition {
        reason: EngineTransitionReason,
        /// Position in the previous item when the transition happened.
        old_position_ms: u64,
    },
    PositionDiscontinuity {
        reason: DiscontinuityReason,
        old_position_ms: u64,
        new_position_ms: u64,
    },
    MetadataParsed(ParsedMetadata),
    PlayerError(EngineError),
}

/// Trait for host media engines driven by the queue core.
///
/// Index-taking methods use engine timeline indices, which the core keeps
/// identical to its own queue indices. Implementations must keep their
/// current index pointing at the same source across inserts, removals and
/// moves that do not touch that source, and must move it to the source that
/// took its slot (or the new last source) when the current source is removed.
pub trait MediaEngine: PlatformSend {
    /// Install the channel the engine reports [`EngineEvent`]s through.
    fn set_callback_sender(&mut self, sender: CallbackSender);

    /// Apply buffering and device options. Called once before any source is added.
    fn configure(&mut self, options: EngineOptions) -> Result<()>;

    /// Insert `sources` so that the first one lands at `index`.
    fn add_sources(&mut self, index: usize, sources: Vec<EngineSource>) -> Result<()>;

    /// Remove the sources in `range`.
    fn remove_sources(&mut self, range: Range<usize>) -> Result<()>;

    /// Move the source at `from` so that it ends up at `to`.
    fn move_source(&mut self, from: usize, to: usize) -> Result<()>;

    /// Swap the source at `index` for `source` without disturbing other slots.
    fn replace_source(&mut self, index: usize, source: EngineSource) -> Result<()>;

    /// Remove every source.
    fn clear(&mut self) -> Result<()>;

    /// Number of sources on the timeline.
    fn source_count(&self) -> usize;

    /// Current timeline index, `None` when the timeline is empty.
    fn current_index(&self) -> Option<usize>;

    /// Seek to `position_ms` inside the source at `index`.
    fn seek_to(&mut self, index: usize, position_ms: u64) -> Result<()>;

    /// (Re-)prepare the current source. Leaves the idle state.
    fn prepare(&mut self) -> Result<()>;

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play_when_ready(&self) -> bool;

    /// When `true`, report [`EngineState::Ended`] at the end of every source
    /// instead of advancing to the next one.
    fn set_stop_at_item_end(&mut self, stop: bool);

    /// Stop playback and reset the engine to idle, keeping the timeline.
    fn stop(&mut self) -> Result<()>;

    fn set_playback_speed(&mut self, speed: f32) -> Result<()>;

    fn set_volume(&mut self, volume: f32) -> Result<()>;

    fn position_ms(&self) -> u64;

    /// Duration of the current source, when known.
    fn duration_ms(&self) -> Option<u64>;

    fn buffered_position_ms(&self) -> u64;

    fn is_playing(&self) -> bool;

    /// Free native resources. The engine must not be used afterwards.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_options_defaults() {
        let opts = EngineOptions::default();
        assert_eq!(opts.min_buffer_ms, 50_000);
        assert_eq!(opts.playback_buffer_ms, 2_500);
        assert!(opts.handle_audio_becoming_noisy);
    }

    #[test]
    fn source_remote_detection() {
        assert!(EngineSource::new("https://cdn.example/a.mp3", MediaType::Default).is_remote());
        assert!(!EngineSource::new("file:///music/a.flac", MediaType::Default).is_remote());
        assert!(MediaType::Hls.is_adaptive());
        assert!(!MediaType::Default.is_adaptive());
    }

    #[test]
    fn parsed_metadata_emptiness() {
        assert!(ParsedMetadata::default().is_empty());
        let meta = ParsedMetadata {
            title: Some("Live".into()),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }

    #[test]
    fn engine_event_serializes() {
        let event = EngineEvent::MediaItemTransition {
            reason: EngineTransitionReason::Auto,
            old_position_ms: 1000,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
