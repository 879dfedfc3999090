//! Notification configuration
//!
//! A [`NotificationConfig`] declares which transport buttons the system
//! notification offers, in render order, plus its static appearance.

use crate::error::{NotificationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of actions the compact (collapsed) layout shows.
pub const MAX_COMPACT_ACTIONS: usize = 3;

/// Capability a button exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Renders as play or pause depending on playback.
    PlayPause,
    Stop,
    Next,
    Previous,
    Forward,
    Rewind,
    /// Seekable progress bar.
    SeekTo,
}

impl ButtonKind {
    pub fn name(&self) -> &'static str {
        match self {
            ButtonKind::PlayPause => "play_pause",
            ButtonKind::Stop => "stop",
            ButtonKind::Next => "next",
            ButtonKind::Previous => "previous",
            ButtonKind::Forward => "forward",
            ButtonKind::Rewind => "rewind",
            ButtonKind::SeekTo => "seek_to",
        }
    }
}

/// One declared button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationButton {
    pub kind: ButtonKind,
    /// Icon override. For [`ButtonKind::PlayPause`] this is the play icon.
    pub icon: Option<String>,
    /// Pause icon override for [`ButtonKind::PlayPause`]; ignored otherwise.
    pub alternate_icon: Option<String>,
    /// Show in the compact layout.
    pub is_compact: bool,
}

impl NotificationButton {
    pub fn new(kind: ButtonKind) -> Self {
        Self {
            kind,
            icon: None,
            alternate_icon: None,
            is_compact: false,
        }
    }

    pub fn play_pause() -> Self {
        Self::new(ButtonKind::PlayPause)
    }

    pub fn stop() -> Self {
        Self::new(ButtonKind::Stop)
    }

    pub fn next() -> Self {
        Self::new(ButtonKind::Next)
    }

    pub fn previous() -> Self {
        Self::new(ButtonKind::Previous)
    }

    pub fn forward() -> Self {
        Self::new(ButtonKind::Forward)
    }

    pub fn rewind() -> Self {
        Self::new(ButtonKind::Rewind)
    }

    pub fn seek_to() -> Self {
        Self::new(ButtonKind::SeekTo)
    }

    pub fn compact(mut self) -> Self {
        self.is_compact = true;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_alternate_icon(mut self, icon: impl Into<String>) -> Self {
        self.alternate_icon = Some(icon.into());
        self
    }
}

/// Static notification setup passed to
/// [`NotificationManager::create_notification`](crate::NotificationManager::create_notification).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Buttons in render order. Each kind may appear once.
    pub buttons: Vec<NotificationButton>,
    /// ARGB accent colour.
    pub accent_color: Option<u32>,
    pub small_icon: Option<String>,
    /// Host intent/URI opened when the notification is tapped.
    pub tap_intent: Option<String>,
}

impl NotificationConfig {
    pub fn new(buttons: Vec<NotificationButton>) -> Self {
        Self {
            buttons,
            ..Default::default()
        }
    }

    pub fn with_accent_color(mut self, argb: u32) -> Self {
        self.accent_color = Some(argb);
        self
    }

    pub fn with_small_icon(mut self, icon: impl Into<String>) -> Self {
        self.small_icon = Some(icon.into());
        self
    }

    pub fn with_tap_intent(mut self, intent: impl Into<String>) -> Self {
        self.tap_intent = Some(intent.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for button in &self.buttons {
            if !seen.insert(button.kind) {
                return Err(NotificationError::InvalidConfig(format!(
                    "button '{}' declared more than once",
                    button.kind.name()
                )));
            }
            if button.icon.as_deref() == Some("") || button.alternate_icon.as_deref() == Some("")
            {
                return Err(NotificationError::InvalidConfig(format!(
                    "button '{}' has an empty icon override",
                    button.kind.name()
                )));
            }
        }
        Ok(())
    }

    pub fn has_button(&self, kind: ButtonKind) -> bool {
        self.buttons.iter().any(|b| b.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_builder() {
        let button = NotificationButton::play_pause()
            .compact()
            .with_icon("ic_play")
            .with_alternate_icon("ic_pause");

        assert_eq!(button.kind, ButtonKind::PlayPause);
        assert!(button.is_compact);
        assert_eq!(button.icon.as_deref(), Some("ic_play"));
        assert_eq!(button.alternate_icon.as_deref(), Some("ic_pause"));
    }

    #[test]
    fn test_duplicate_buttons_rejected() {
        let config = NotificationConfig::new(vec![
            NotificationButton::next(),
            NotificationButton::next().compact(),
        ]);
        assert!(matches!(
            config.validate(),
            Err(NotificationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_icon_rejected() {
        let config = NotificationConfig::new(vec![NotificationButton::stop().with_icon("")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config() {
        let config = NotificationConfig::new(vec![
            NotificationButton::previous().compact(),
            NotificationButton::play_pause().compact(),
            NotificationButton::next().compact(),
            NotificationButton::seek_to(),
        ])
        .with_accent_color(0xFF11_2233)
        .with_small_icon("ic_note");

        assert!(config.validate().is_ok());
        assert!(config.has_button(ButtonKind::SeekTo));
        assert!(!config.has_button(ButtonKind::Stop));
    }
}
