//! # Headless Bridge Implementations
//!
//! Reference implementations of the bridge traits for hosts without a native
//! media stack: CI, servers and command-line tools.
//!
//! ## Overview
//!
//! - `MediaEngine` as [`HeadlessEngine`], an in-memory timeline with a
//!   manually driven playhead
//! - `NotificationHost` as [`RecordingNotificationHost`]
//! - `LoggerSink` as [`ConsoleLogger`]
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_headless::{HeadlessEngine, RecordingNotificationHost};
//! use core_playback::{PlayerConfig, QueuedAudioPlayer};
//!
//! let engine = HeadlessEngine::new();
//! let player = QueuedAudioPlayer::new(
//!     PlayerConfig::default(),
//!     Box::new(engine.clone()),
//!     Box::new(RecordingNotificationHost::new()),
//! )?;
//!
//! // Drive playback from the outside.
//! engine.finish_current_item();
//! ```

mod engine;
mod logger;
mod notification;

pub use engine::HeadlessEngine;
pub use logger::ConsoleLogger;
pub use notification::{NotificationRecord, RecordingNotificationHost};
