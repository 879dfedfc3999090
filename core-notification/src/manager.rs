//! # Notification Manager
//!
//! Keeps the system transport notification in sync with playback.
//!
//! ## Overview
//!
//! The manager owns the [`NotificationHost`] and re-renders a complete
//! [`SystemNotification`] whenever something visible changes: player state,
//! current-item metadata, stream metadata or button visibility. The player
//! feeds it; applications only create, tweak and tear it down.
//!
//! Metadata is resolved field by field, highest priority first:
//!
//! 1. values passed to [`NotificationManager::override_metadata`]
//! 2. the current audio item's own metadata
//! 3. metadata embedded in the stream (ICY, ID3...)
//!
//! ## Events
//!
//! The first post after creation (or after [`hide_notification`]) publishes
//! [`NotificationState::Posted`]; cancelling publishes
//! [`NotificationState::Cancelled`].
//!
//! [`hide_notification`]: NotificationManager::hide_notification

use crate::config::{ButtonKind, NotificationButton, NotificationConfig, MAX_COMPACT_ACTIONS};
use crate::error::{NotificationError, Result};
use crate::metadata::NotificationMetadata;
use bridge_traits::engine::ParsedMetadata;
use bridge_traits::notification::{
    NotificationAction, NotificationActionKind, NotificationHost, SystemNotification,
};
use core_runtime::events::{EventHub, NotificationState, PlayerState};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, instrument};

/// Identifier of the single notification the manager posts.
pub const NOTIFICATION_ID: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
struct PlaybackSnapshot {
    state: Option<PlayerState>,
    position_ms: u64,
    duration_ms: Option<u64>,
}

impl PlaybackSnapshot {
    fn is_playing(&self) -> bool {
        matches!(self.state, Some(PlayerState::Playing))
    }
}

pub struct NotificationManager {
    host: Box<dyn NotificationHost>,
    events: EventHub,
    config: Option<NotificationConfig>,
    hidden_buttons: HashSet<ButtonKind>,
    item_metadata: NotificationMetadata,
    stream_metadata: NotificationMetadata,
    overridden: Option<NotificationMetadata>,
    playback: PlaybackSnapshot,
    posted: bool,
    destroyed: bool,
}

impl NotificationManager {
    pub fn new(host: Box<dyn NotificationHost>, events: EventHub) -> Self {
        Self {
            host,
            events,
            config: None,
            hidden_buttons: HashSet::new(),
            item_metadata: NotificationMetadata::default(),
            stream_metadata: NotificationMetadata::default(),
            overridden: None,
            playback: PlaybackSnapshot::default(),
            posted: false,
            destroyed: false,
        }
    }

    /// Declare the notification's buttons and post it.
    ///
    /// # Errors
    ///
    /// - [`NotificationError::AlreadyCreated`] on a second call
    /// - [`NotificationError::InvalidConfig`] if `config` fails validation
    /// - [`NotificationError::Host`] if the host rejects the post
    #[instrument(skip(self, config), fields(buttons = config.buttons.len()))]
    pub fn create_notification(&mut self, config: NotificationConfig) -> Result<()> {
        self.ensure_alive()?;
        if self.config.is_some() {
            return Err(NotificationError::AlreadyCreated);
        }
        config.validate()?;

        info!("Creating notification");
        self.config = Some(config);
        self.post()
    }

    pub fn is_created(&self) -> bool {
        self.config.is_some()
    }

    /// Whether the notification is currently shown by the host.
    pub fn is_posted(&self) -> bool {
        self.posted
    }

    pub fn config(&self) -> Option<&NotificationConfig> {
        self.config.as_ref()
    }

    /// Show or hide a declared button. Buttons that were not declared stay
    /// absent regardless.
    pub fn set_button_visible(&mut self, kind: ButtonKind, visible: bool) -> Result<()> {
        self.ensure_alive()?;
        let changed = if visible {
            self.hidden_buttons.remove(&kind)
        } else {
            self.hidden_buttons.insert(kind)
        };
        if changed {
            debug!(button = kind.name(), visible, "Button visibility changed");
            self.refresh()?;
        }
        Ok(())
    }

    pub fn is_button_visible(&self, kind: ButtonKind) -> bool {
        self.config.as_ref().is_some_and(|c| c.has_button(kind))
            && !self.hidden_buttons.contains(&kind)
    }

    pub fn set_play_pause_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::PlayPause, visible)
    }

    pub fn set_stop_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::Stop, visible)
    }

    pub fn set_next_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::Next, visible)
    }

    pub fn set_previous_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::Previous, visible)
    }

    pub fn set_forward_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::Forward, visible)
    }

    pub fn set_rewind_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::Rewind, visible)
    }

    pub fn set_seek_to_visible(&mut self, visible: bool) -> Result<()> {
        self.set_button_visible(ButtonKind::SeekTo, visible)
    }

    /// Mirror the player state and playhead.
    ///
    /// A hidden notification is posted again once playback resumes.
    pub fn update_state(
        &mut self,
        state: PlayerState,
        position_ms: u64,
        duration_ms: Option<u64>,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.playback = PlaybackSnapshot {
            state: Some(state),
            position_ms,
            duration_ms,
        };

        if !self.posted && self.config.is_some() && state == PlayerState::Playing {
            return self.post();
        }
        self.refresh()
    }

    /// Replace the current item's metadata. Drops stream metadata and any
    /// override, which belonged to the previous item.
    pub fn update_metadata(&mut self, metadata: NotificationMetadata) -> Result<()> {
        self.ensure_alive()?;
        self.item_metadata = metadata;
        self.stream_metadata = NotificationMetadata::default();
        self.overridden = None;
        self.refresh()
    }

    /// Record metadata found in the media stream, used where the item has none.
    pub fn update_stream_metadata(&mut self, parsed: &ParsedMetadata) -> Result<()> {
        self.ensure_alive()?;
        let incoming = NotificationMetadata::from(parsed);
        self.stream_metadata = incoming.or(&self.stream_metadata);
        self.refresh()
    }

    /// Force displayed values for the current item. Fields left `None` keep
    /// falling back to item and stream metadata.
    pub fn override_metadata(&mut self, metadata: NotificationMetadata) -> Result<()> {
        self.ensure_alive()?;
        self.overridden = Some(metadata);
        self.refresh()
    }

    /// Metadata as it would be displayed right now.
    pub fn current_metadata(&self) -> NotificationMetadata {
        let base = self.item_metadata.clone().or(&self.stream_metadata);
        match &self.overridden {
            Some(overridden) => overridden.clone().or(&base),
            None => base,
        }
    }

    /// Cancel the notification. Keeps the configuration so a later state
    /// update can post it again.
    pub fn hide_notification(&mut self) -> Result<()> {
        if !self.posted {
            return Ok(());
        }
        self.host.cancel(NOTIFICATION_ID)?;
        self.posted = false;
        info!("Notification hidden");
        self.events
            .notification_state()
            .publish(NotificationState::Cancelled);
        Ok(())
    }

    /// Cancel the notification and release the host session. Idempotent.
    pub fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let hidden = self.hide_notification();
        self.host.release();
        self.destroyed = true;
        self.config = None;
        debug!("Notification manager destroyed");
        hidden
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Render the notification for the current state, if created.
    pub fn render(&self) -> Option<SystemNotification> {
        let config = self.config.as_ref()?;
        let metadata = self.current_metadata();
        let is_playing = self.playback.is_playing();

        let mut compact = 0;
        let actions = config
            .buttons
            .iter()
            .filter(|button| !self.hidden_buttons.contains(&button.kind))
            .map(|button| {
                let in_compact = button.is_compact && compact < MAX_COMPACT_ACTIONS;
                if in_compact {
                    compact += 1;
                }
                render_action(button, is_playing, in_compact)
            })
            .collect();

        Some(SystemNotification {
            id: NOTIFICATION_ID,
            title: metadata.title,
            artist: metadata.artist,
            album: metadata.album,
            artwork: metadata.artwork,
            duration_ms: self.playback.duration_ms.or(metadata.duration_ms),
            position_ms: self.playback.position_ms,
            is_playing,
            actions,
            accent_color: config.accent_color,
            small_icon: config.small_icon.clone(),
            tap_intent: config.tap_intent.clone(),
        })
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(NotificationError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn post(&mut self) -> Result<()> {
        let Some(notification) = self.render() else {
            return Err(NotificationError::NotCreated);
        };
        self.host.post(&notification)?;
        if !self.posted {
            self.posted = true;
            self.events
                .notification_state()
                .publish(NotificationState::Posted);
        }
        Ok(())
    }

    /// Re-post if currently shown.
    fn refresh(&mut self) -> Result<()> {
        if self.posted {
            self.post()
        } else {
            Ok(())
        }
    }
}

fn render_action(button: &NotificationButton, is_playing: bool, compact: bool) -> NotificationAction {
    let (kind, icon) = match button.kind {
        ButtonKind::PlayPause if is_playing => {
            (NotificationActionKind::Pause, button.alternate_icon.clone())
        }
        ButtonKind::PlayPause => (NotificationActionKind::Play, button.icon.clone()),
        ButtonKind::Stop => (NotificationActionKind::Stop, button.icon.clone()),
        ButtonKind::Next => (NotificationActionKind::Next, button.icon.clone()),
        ButtonKind::Previous => (NotificationActionKind::Previous, button.icon.clone()),
        ButtonKind::Forward => (NotificationActionKind::Forward, button.icon.clone()),
        ButtonKind::Rewind => (NotificationActionKind::Rewind, button.icon.clone()),
        ButtonKind::SeekTo => (NotificationActionKind::SeekTo, button.icon.clone()),
    };
    NotificationAction {
        kind,
        icon,
        compact,
    }
}

impl fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationManager")
            .field("created", &self.config.is_some())
            .field("posted", &self.posted)
            .field("destroyed", &self.destroyed)
            .field("hidden_buttons", &self.hidden_buttons)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_headless::{NotificationRecord, RecordingNotificationHost};

    fn manager() -> (NotificationManager, RecordingNotificationHost, EventHub) {
        let host = RecordingNotificationHost::new();
        let hub = EventHub::new(16);
        let manager = NotificationManager::new(Box::new(host.clone()), hub.clone());
        (manager, host, hub)
    }

    fn transport_config() -> NotificationConfig {
        NotificationConfig::new(vec![
            NotificationButton::previous().compact(),
            NotificationButton::play_pause().compact().with_alternate_icon("ic_pause"),
            NotificationButton::next().compact(),
            NotificationButton::stop().compact(),
            NotificationButton::seek_to(),
        ])
    }

    #[test]
    fn test_create_posts_and_publishes() {
        let (mut manager, host, hub) = manager();
        let mut states = hub.notification_state().subscribe();

        manager.create_notification(transport_config()).unwrap();

        assert!(manager.is_posted());
        assert_eq!(host.post_count(), 1);
        assert_eq!(states.drain(), vec![NotificationState::Posted]);
    }

    #[test]
    fn test_second_create_fails() {
        let (mut manager, _host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();
        assert!(matches!(
            manager.create_notification(transport_config()),
            Err(NotificationError::AlreadyCreated)
        ));
    }

    #[test]
    fn test_compact_view_limited_to_three() {
        let (mut manager, host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();

        let shown = host.visible().unwrap();
        let compact: Vec<_> = shown.compact_actions().map(|a| a.kind).collect();
        assert_eq!(
            compact,
            vec![
                NotificationActionKind::Previous,
                NotificationActionKind::Play,
                NotificationActionKind::Next,
            ]
        );
        assert!(shown.has_action(NotificationActionKind::Stop));
    }

    #[test]
    fn test_hidden_button_frees_compact_slot() {
        let (mut manager, host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();
        manager.set_previous_visible(false).unwrap();

        let shown = host.visible().unwrap();
        assert!(!shown.has_action(NotificationActionKind::Previous));
        let compact: Vec<_> = shown.compact_actions().map(|a| a.kind).collect();
        assert_eq!(
            compact,
            vec![
                NotificationActionKind::Play,
                NotificationActionKind::Next,
                NotificationActionKind::Stop,
            ]
        );
        assert!(!manager.is_button_visible(ButtonKind::Previous));
        assert!(manager.is_button_visible(ButtonKind::Next));
    }

    #[test]
    fn test_play_pause_follows_state() {
        let (mut manager, host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();

        manager
            .update_state(PlayerState::Playing, 1_000, Some(200_000))
            .unwrap();
        let shown = host.visible().unwrap();
        assert!(shown.is_playing);
        let pause = shown
            .actions
            .iter()
            .find(|a| a.kind == NotificationActionKind::Pause)
            .unwrap();
        assert_eq!(pause.icon.as_deref(), Some("ic_pause"));
        assert_eq!(shown.duration_ms, Some(200_000));
    }

    #[test]
    fn test_metadata_priority() {
        let (mut manager, host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();

        manager
            .update_metadata(NotificationMetadata::default().with_title("Item title"))
            .unwrap();
        manager
            .update_stream_metadata(&ParsedMetadata {
                title: Some("Stream title".into()),
                artist: Some("Stream artist".into()),
                ..Default::default()
            })
            .unwrap();

        let shown = host.visible().unwrap();
        assert_eq!(shown.title.as_deref(), Some("Item title"));
        assert_eq!(shown.artist.as_deref(), Some("Stream artist"));

        manager
            .override_metadata(NotificationMetadata::default().with_title("Custom"))
            .unwrap();
        let shown = host.visible().unwrap();
        assert_eq!(shown.title.as_deref(), Some("Custom"));
        assert_eq!(shown.artist.as_deref(), Some("Stream artist"));

        // A new item resets stream metadata and the override.
        manager
            .update_metadata(NotificationMetadata::default().with_title("Next item"))
            .unwrap();
        let shown = host.visible().unwrap();
        assert_eq!(shown.title.as_deref(), Some("Next item"));
        assert_eq!(shown.artist, None);
    }

    #[test]
    fn test_hide_and_repost_on_play() {
        let (mut manager, host, hub) = manager();
        let mut states = hub.notification_state().subscribe();
        manager.create_notification(transport_config()).unwrap();

        manager.hide_notification().unwrap();
        assert!(!manager.is_posted());
        assert_eq!(host.visible(), None);

        manager.update_state(PlayerState::Paused, 0, None).unwrap();
        assert!(!manager.is_posted());

        manager.update_state(PlayerState::Playing, 0, None).unwrap();
        assert!(manager.is_posted());

        assert_eq!(
            states.drain(),
            vec![
                NotificationState::Posted,
                NotificationState::Cancelled,
                NotificationState::Posted,
            ]
        );
    }

    #[test]
    fn test_destroy_releases_host() {
        let (mut manager, host, _hub) = manager();
        manager.create_notification(transport_config()).unwrap();
        manager.destroy().unwrap();
        manager.destroy().unwrap();

        let records = host.records();
        assert_eq!(records[records.len() - 2], NotificationRecord::Cancelled(NOTIFICATION_ID));
        assert_eq!(records[records.len() - 1], NotificationRecord::Released);
        assert!(matches!(
            manager.create_notification(transport_config()),
            Err(NotificationError::Destroyed)
        ));
    }

    #[test]
    fn test_updates_before_create_do_not_post() {
        let (mut manager, host, _hub) = manager();
        manager.update_state(PlayerState::Playing, 0, None).unwrap();
        manager
            .update_metadata(NotificationMetadata::default().with_title("Early"))
            .unwrap();
        assert_eq!(host.post_count(), 0);

        manager.create_notification(transport_config()).unwrap();
        assert_eq!(host.visible().unwrap().title.as_deref(), Some("Early"));
    }
}
