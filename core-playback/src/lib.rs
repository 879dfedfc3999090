//! # Queued Playback Core
//!
//! A queue and event layer over a host media engine.
//!
//! ## Overview
//!
//! This crate handles:
//! - The queue of [`AudioItem`]s, mirrored 1:1 with the engine timeline
//! - Projection of engine callbacks onto [`PlayerState`] and Event Hub events
//! - Repeat policy (off / one / all)
//! - Forwarding or executing OS transport commands and audio focus changes
//! - An LRU disk cache per identifier, shared across players
//!
//! Decoding, rendering and streaming stay in the engine behind
//! [`MediaEngine`](bridge_traits::engine::MediaEngine).

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod player;
pub mod queue;
pub mod state;

pub use cache::{CacheConfig, CacheProvider, CacheStats, SimpleCache};
pub use config::{BufferConfig, PlayerConfig, PlayerConfigBuilder};
pub use error::{PlaybackError, Result};
pub use models::{AudioItem, AudioItemOptions, PlayerState, RepeatMode};
pub use player::QueuedAudioPlayer;
pub use queue::Queue;
