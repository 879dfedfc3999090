//! # Host Bridge Traits
//!
//! Contracts between the queued player core and the host platform.
//!
//! ## Overview
//!
//! The core never decodes, renders or talks to the OS itself. Each capability
//! it needs is a trait the host implements:
//!
//! - [`MediaEngine`](engine::MediaEngine) - the native playback engine and its
//!   internal timeline of sources
//! - [`NotificationHost`](notification::NotificationHost) - the system media
//!   notification / media session
//! - [`MediaCache`](cache::MediaCache) - disk cache the engine reads through
//! - [`LoggerSink`](logging::LoggerSink) - forwards structured logs to the host
//!
//! Inbound traffic (engine callbacks, transport commands, audio focus) flows
//! the other way through a [`CallbackSender`](callback::CallbackSender), which
//! hosts may call from any thread.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert their native errors into it and keep the
//! message actionable (index, size, URI).
//!
//! ## Thread Safety
//!
//! Engines and notification hosts are `Send` so they can be created on one
//! thread and moved onto the player context. Caches and logger sinks are
//! shared and therefore `Send + Sync`.

pub mod cache;
pub mod callback;
pub mod engine;
pub mod error;
pub mod logging;
pub mod notification;
pub mod platform;
pub mod session;

pub use error::BridgeError;

pub use cache::MediaCache;
pub use callback::{callback_channel, CallbackReceiver, CallbackSender, HostCallback};
pub use engine::{
    DiscontinuityReason, EngineError, EngineEvent, EngineOptions, EngineSource, EngineState,
    EngineTransitionReason, MediaEngine, MediaType, MetadataFormat, ParsedMetadata,
};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use notification::{
    NotificationAction, NotificationActionKind, NotificationHost, SystemNotification,
};
pub use session::{FocusChangeData, MediaSessionCallback, SessionEvent};
