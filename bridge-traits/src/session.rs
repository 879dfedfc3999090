//! Inbound types from the OS media session.
//!
//! Hardware buttons, voice assistants, the lock screen and the system
//! notification all end up as a [`SessionEvent`] delivered through the
//! player's callback channel.

use serde::{Deserialize, Serialize};

/// Transport command triggered outside the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value")]
pub enum MediaSessionCallback {
    Play,
    Pause,
    Next,
    Previous,
    Forward,
    Rewind,
    Stop,
    /// Seek to an absolute position in milliseconds.
    Seek(u64),
    /// Rate the current item. Value range depends on the configured rating style.
    Rating(f32),
}

impl MediaSessionCallback {
    pub fn name(&self) -> &'static str {
        match self {
            MediaSessionCallback::Play => "play",
            MediaSessionCallback::Pause => "pause",
            MediaSessionCallback::Next => "next",
            MediaSessionCallback::Previous => "previous",
            MediaSessionCallback::Forward => "forward",
            MediaSessionCallback::Rewind => "rewind",
            MediaSessionCallback::Stop => "stop",
            MediaSessionCallback::Seek(_) => "seek",
            MediaSessionCallback::Rating(_) => "rating",
        }
    }
}

/// Audio focus change reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChangeData {
    /// Playback should be paused (focus lost, transient or permanent).
    pub is_paused: bool,
    /// Another app took focus for good; resuming requires user action.
    pub is_focus_lost_permanently: bool,
}

/// Callbacks from the OS media-session and notification subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Transport(MediaSessionCallback),
    AudioFocusChanged(FocusChangeData),
    /// Output is about to switch to the device speaker (headphones unplugged).
    AudioBecomingNoisy,
    /// The user swiped the notification away.
    NotificationDismissed,
}
