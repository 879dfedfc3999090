//! # Core Runtime
//!
//! Foundational infrastructure shared by the player crates:
//! - [`events`]: the Event Hub, typed broadcast channels for player events
//! - [`logging`]: `tracing` subscriber setup and host log forwarding
//!
//! ## Overview
//!
//! Nothing here knows about queues or engines. The playback and notification
//! crates publish into an [`EventHub`](events::EventHub) they are handed, and
//! the host decides once at startup how logs are rendered.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{
    EventChannel, EventHub, EventReceiver, FocusChangeData, MediaSessionCallback,
    NotificationState, PlaybackEndedReason, PlaybackErrorEvent, PlaybackMetadata, PlayerState,
    PositionChangedReason, TransitionReason,
};
