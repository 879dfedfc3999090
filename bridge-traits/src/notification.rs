//! System notification / media-session output contract.
//!
//! The core renders a complete [`SystemNotification`] every time something
//! visible changes and hands it to the host, which maps it onto the platform
//! media notification (Android `MediaStyle`, macOS Now Playing, MPRIS, ...).

use crate::{error::Result, platform::PlatformSend};
use serde::{Deserialize, Serialize};

/// Transport action rendered as a notification button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationActionKind {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Forward,
    Rewind,
    /// Seekable progress bar rather than a button.
    SeekTo,
}

/// One rendered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub kind: NotificationActionKind,
    /// Host icon resource; `None` uses the host's default icon for `kind`.
    pub icon: Option<String>,
    /// Shown in the collapsed (compact) layout.
    pub compact: bool,
}

/// Fully rendered notification snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotification {
    pub id: u32,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub duration_ms: Option<u64>,
    pub position_ms: u64,
    pub is_playing: bool,
    pub actions: Vec<NotificationAction>,
    /// ARGB accent colour.
    pub accent_color: Option<u32>,
    pub small_icon: Option<String>,
    /// Host intent/URI opened when the notification is tapped.
    pub tap_intent: Option<String>,
}

impl SystemNotification {
    /// Actions shown in the compact layout, in render order.
    pub fn compact_actions(&self) -> impl Iterator<Item = &NotificationAction> {
        self.actions.iter().filter(|a| a.compact)
    }

    pub fn has_action(&self, kind: NotificationActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }
}

/// Host notification surface.
pub trait NotificationHost: PlatformSend {
    /// Post or update the notification with `notification.id`.
    fn post(&mut self, notification: &SystemNotification) -> Result<()>;

    /// Remove the notification with `id`.
    fn cancel(&mut self, id: u32) -> Result<()>;

    /// Tear down the media session backing the notification.
    fn release(&mut self) {}
}
