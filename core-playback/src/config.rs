//! # Player Configuration
//!
//! [`PlayerConfig`] holds everything fixed for the lifetime of a
//! [`QueuedAudioPlayer`](crate::player::QueuedAudioPlayer): caching, buffer
//! sizes, OS integration flags and seek intervals.
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::cache::CacheConfig;
//! use core_playback::config::PlayerConfig;
//!
//! let config = PlayerConfig::builder()
//!     .cache(CacheConfig::new("music").with_max_size(512 * 1024 * 1024))
//!     .intercept_external_actions(true)
//!     .handle_audio_focus(true)
//!     .forward_interval_ms(30_000)
//!     .build()
//!     .expect("valid config");
//!
//! assert!(config.cache.is_enabled());
//! ```
//!
//! ## Error Handling
//!
//! `build()` validates eagerly and reports the first inconsistent value:
//!
//! ```should_panic
//! use core_playback::config::{BufferConfig, PlayerConfig};
//!
//! // min buffer larger than max buffer
//! PlayerConfig::builder()
//!     .buffer(BufferConfig { min_buffer_ms: 60_000, max_buffer_ms: 30_000, ..Default::default() })
//!     .build()
//!     .expect("should fail");
//! ```

use crate::cache::CacheConfig;
use crate::error::{PlaybackError, Result};
use bridge_traits::engine::EngineOptions;
use core_runtime::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// Largest event channel capacity accepted.
const MAX_EVENT_CAPACITY: usize = 65_536;

/// Engine buffering thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Media the engine tries to keep buffered at all times.
    ///
    /// Default: 50 seconds.
    #[serde(default = "default_min_buffer_ms")]
    pub min_buffer_ms: u64,

    /// Upper bound of media buffered ahead.
    ///
    /// Default: 50 seconds.
    #[serde(default = "default_max_buffer_ms")]
    pub max_buffer_ms: u64,

    /// Media required before playback starts or resumes after a seek.
    ///
    /// Default: 2.5 seconds.
    #[serde(default = "default_playback_buffer_ms")]
    pub playback_buffer_ms: u64,

    /// Media kept behind the playhead for fast backwards seeks.
    ///
    /// Default: 0.
    #[serde(default)]
    pub back_buffer_ms: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            min_buffer_ms: default_min_buffer_ms(),
            max_buffer_ms: default_max_buffer_ms(),
            playback_buffer_ms: default_playback_buffer_ms(),
            back_buffer_ms: 0,
        }
    }
}

impl BufferConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_buffer_ms > self.max_buffer_ms {
            return Err(PlaybackError::Config(format!(
                "min_buffer_ms ({}) must not exceed max_buffer_ms ({})",
                self.min_buffer_ms, self.max_buffer_ms
            )));
        }
        if self.playback_buffer_ms > self.min_buffer_ms {
            return Err(PlaybackError::Config(format!(
                "playback_buffer_ms ({}) must not exceed min_buffer_ms ({})",
                self.playback_buffer_ms, self.min_buffer_ms
            )));
        }
        Ok(())
    }
}

fn default_min_buffer_ms() -> u64 {
    50_000
}

fn default_max_buffer_ms() -> u64 {
    50_000
}

fn default_playback_buffer_ms() -> u64 {
    2_500
}

fn default_forward_interval_ms() -> u64 {
    15_000
}

fn default_rewind_interval_ms() -> u64 {
    5_000
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

/// Player configuration. Use [`PlayerConfig::builder`] to get validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Disk cache for remote sources. Disabled unless a size is set.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Publish OS transport commands on the `external_action` channel
    /// instead of executing them.
    #[serde(default)]
    pub intercept_external_actions: bool,

    /// Pause on audio focus loss and resume when a transient loss ends.
    #[serde(default)]
    pub handle_audio_focus: bool,

    /// Pause when output is about to switch to the device speaker.
    #[serde(default)]
    pub handle_audio_becoming_noisy: bool,

    #[serde(default)]
    pub buffer: BufferConfig,

    /// User agent for remote sources whose item does not set one.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Step used by `forward()`.
    #[serde(default = "default_forward_interval_ms")]
    pub forward_interval_ms: u64,

    /// Step used by `rewind()`.
    #[serde(default = "default_rewind_interval_ms")]
    pub rewind_interval_ms: u64,

    /// Per-subscriber buffer of every Event Hub channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            intercept_external_actions: false,
            handle_audio_focus: false,
            handle_audio_becoming_noisy: false,
            buffer: BufferConfig::default(),
            user_agent: None,
            forward_interval_ms: default_forward_interval_ms(),
            rewind_interval_ms: default_rewind_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Buffer thresholds are ordered (playback <= min <= max)
    /// - Seek intervals are non-zero
    /// - Event capacity is within 1..=65536
    /// - User agent, when set, is not blank
    /// - Cache config is valid when caching is enabled
    pub fn validate(&self) -> Result<()> {
        self.buffer.validate()?;

        if self.forward_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "forward_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.rewind_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "rewind_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.event_capacity == 0 || self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(PlaybackError::Config(format!(
                "event_capacity must be between 1 and {}",
                MAX_EVENT_CAPACITY
            )));
        }

        if let Some(ua) = &self.user_agent {
            if ua.trim().is_empty() {
                return Err(PlaybackError::Config(
                    "user_agent cannot be blank".to_string(),
                ));
            }
        }

        if self.cache.is_enabled() {
            self.cache.validate().map_err(PlaybackError::Config)?;
        }

        Ok(())
    }

    /// Options handed to `MediaEngine::configure`.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            min_buffer_ms: self.buffer.min_buffer_ms,
            max_buffer_ms: self.buffer.max_buffer_ms,
            playback_buffer_ms: self.buffer.playback_buffer_ms,
            back_buffer_ms: self.buffer.back_buffer_ms,
            handle_audio_becoming_noisy: self.handle_audio_becoming_noisy,
        }
    }
}

/// Builder for [`PlayerConfig`]. Unset values take the defaults.
#[derive(Debug, Default)]
pub struct PlayerConfigBuilder {
    cache: Option<CacheConfig>,
    intercept_external_actions: Option<bool>,
    handle_audio_focus: Option<bool>,
    handle_audio_becoming_noisy: Option<bool>,
    buffer: Option<BufferConfig>,
    user_agent: Option<String>,
    forward_interval_ms: Option<u64>,
    rewind_interval_ms: Option<u64>,
    event_capacity: Option<usize>,
}

impl PlayerConfigBuilder {
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn intercept_external_actions(mut self, intercept: bool) -> Self {
        self.intercept_external_actions = Some(intercept);
        self
    }

    pub fn handle_audio_focus(mut self, handle: bool) -> Self {
        self.handle_audio_focus = Some(handle);
        self
    }

    pub fn handle_audio_becoming_noisy(mut self, handle: bool) -> Self {
        self.handle_audio_becoming_noisy = Some(handle);
        self
    }

    pub fn buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn forward_interval_ms(mut self, ms: u64) -> Self {
        self.forward_interval_ms = Some(ms);
        self
    }

    pub fn rewind_interval_ms(mut self, ms: u64) -> Self {
        self.rewind_interval_ms = Some(ms);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds and validates the final `PlayerConfig`.
    pub fn build(self) -> Result<PlayerConfig> {
        let defaults = PlayerConfig::default();
        let config = PlayerConfig {
            cache: self.cache.unwrap_or(defaults.cache),
            intercept_external_actions: self
                .intercept_external_actions
                .unwrap_or(defaults.intercept_external_actions),
            handle_audio_focus: self
                .handle_audio_focus
                .unwrap_or(defaults.handle_audio_focus),
            handle_audio_becoming_noisy: self
                .handle_audio_becoming_noisy
                .unwrap_or(defaults.handle_audio_becoming_noisy),
            buffer: self.buffer.unwrap_or(defaults.buffer),
            user_agent: self.user_agent.or(defaults.user_agent),
            forward_interval_ms: self
                .forward_interval_ms
                .unwrap_or(defaults.forward_interval_ms),
            rewind_interval_ms: self
                .rewind_interval_ms
                .unwrap_or(defaults.rewind_interval_ms),
            event_capacity: self.event_capacity.unwrap_or(defaults.event_capacity),
        };

        config.validate()?;
        Ok(config)
    }
}
