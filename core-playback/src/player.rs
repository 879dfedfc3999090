//! # Queued Audio Player
//!
//! [`QueuedAudioPlayer`] keeps a queue of [`AudioItem`]s in lockstep with the
//! host engine's timeline and republishes engine callbacks on the
//! [`EventHub`].
//!
//! ## Ownership model
//!
//! - The [`Queue`] is the only store of item metadata.
//! - The engine is the only store of order *position*: the current index is
//!   always read from [`MediaEngine::current_index`].
//! - Every mutating operation validates first, then applies the same change
//!   to the engine and the queue in one call.
//!
//! ## Callbacks
//!
//! Engines and OS sessions report on their own threads through a
//! [`CallbackSender`]. Nothing is applied until the owner calls
//! [`process_pending_events`](QueuedAudioPlayer::process_pending_events) or
//! awaits [`next_event`](QueuedAudioPlayer::next_event), so all Event Hub
//! publications happen on the owner's context in callback order.
//!
//! ## Repeat
//!
//! Repeat policy lives here, not in the engine. In [`RepeatMode::One`] the
//! engine is told to stop at the end of every item; the resulting `Ended`
//! callback seeks back to the start. In [`RepeatMode::All`] the `Ended`
//! callback on the last item seeks to index 0 and reports an `Auto`
//! transition.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_headless::{HeadlessEngine, RecordingNotificationHost};
//! use core_playback::{AudioItem, PlayerConfig, QueuedAudioPlayer};
//!
//! let mut player = QueuedAudioPlayer::new(
//!     PlayerConfig::default(),
//!     Box::new(HeadlessEngine::new()),
//!     Box::new(RecordingNotificationHost::new()),
//! )?;
//!
//! let mut states = player.event_hub().state_change().subscribe();
//! player.add(vec![AudioItem::new("https://cdn.example/a.mp3")], None, Some(true))?;
//! player.process_pending_events();
//! ```

use crate::cache::{CacheProvider, SimpleCache};
use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::models::{AudioItem, PlayerState, RepeatMode};
use crate::queue::{descending_runs, Queue};
use crate::state::{position_reason, transition_reason, StateMachine};
use bridge_traits::cache::MediaCache;
use bridge_traits::callback::{callback_channel, CallbackReceiver, CallbackSender, HostCallback};
use bridge_traits::engine::{EngineEvent, EngineSource, EngineState, EngineTransitionReason, MediaEngine};
use bridge_traits::notification::NotificationHost;
use bridge_traits::session::{FocusChangeData, MediaSessionCallback, SessionEvent};
use core_notification::{NotificationConfig, NotificationManager, NotificationMetadata};
use core_runtime::events::{
    EventHub, PlaybackEndedReason, PlaybackErrorEvent, PlaybackMetadata, TransitionReason,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct QueuedAudioPlayer {
    config: PlayerConfig,
    engine: Box<dyn MediaEngine>,
    queue: Queue,
    state: StateMachine,
    repeat_mode: RepeatMode,
    events: EventHub,
    notification: NotificationManager,
    callbacks: CallbackReceiver,
    sender: CallbackSender,
    cache: Option<Arc<SimpleCache>>,
    volume: f32,
    playback_speed: f32,
    /// Set while a repeat-all wrap seek is in flight; the engine reports it as
    /// a seek but it is published as `Auto`.
    wrapping_to_start: bool,
    resume_on_focus_gain: bool,
    destroyed: bool,
}

impl QueuedAudioPlayer {
    /// Create a player around a host engine and notification host.
    ///
    /// Installs the callback channel on the engine, applies the buffer
    /// options and opens the disk cache when one is configured.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Config`] if `config` is invalid
    /// - [`PlaybackError::IoError`] if the cache directory cannot be created
    /// - [`PlaybackError::Engine`] if the engine rejects its options
    pub fn new(
        config: PlayerConfig,
        mut engine: Box<dyn MediaEngine>,
        notification_host: Box<dyn NotificationHost>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = CacheProvider::get_or_create(&config.cache)?;

        let events = EventHub::new(config.event_capacity);
        let (sender, callbacks) = callback_channel();
        engine.set_callback_sender(sender.clone());
        engine.configure(config.engine_options())?;
        engine.set_stop_at_item_end(false);

        let notification = NotificationManager::new(notification_host, events.clone());
        let state = StateMachine::new();
        events.state_change().publish(state.state());

        info!(
            cached = cache.is_some(),
            intercept_external_actions = config.intercept_external_actions,
            "Queued audio player created"
        );

        Ok(Self {
            config,
            engine,
            queue: Queue::new(),
            state,
            repeat_mode: RepeatMode::Off,
            events,
            notification,
            callbacks,
            sender,
            cache,
            volume: 1.0,
            playback_speed: 1.0,
            wrapping_to_start: false,
            resume_on_focus_gain: false,
            destroyed: false,
        })
    }

    // ========================================================================
    // Queue Operations
    // ========================================================================

    /// Append `items`, or insert them so the first lands at `at_index`.
    ///
    /// On an empty queue the first item becomes current. `play_when_ready`
    /// leaves the current setting untouched when `None`.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub fn add(
        &mut self,
        items: Vec<AudioItem>,
        at_index: Option<usize>,
        play_when_ready: Option<bool>,
    ) -> Result<()> {
        self.ensure_alive()?;
        if items.is_empty() {
            return Err(PlaybackError::InvalidArgument(
                "cannot add an empty item list".to_string(),
            ));
        }
        let at = self.queue.insert_position(at_index)?;
        let was_empty = self.queue.is_empty();

        if let Some(play) = play_when_ready {
            self.engine.set_play_when_ready(play);
        }
        let sources = items.iter().map(|item| self.engine_source(item)).collect();
        self.engine.add_sources(at, sources)?;
        self.queue.insert(at, items);
        self.state.clear_stop();
        self.engine.prepare()?;

        debug!(at, len = self.queue.len(), "Items added");
        if was_empty {
            self.refresh_item_metadata();
        }
        Ok(())
    }

    /// Replace the current item, or add `item` as the only entry when the
    /// queue is empty. Other entries are kept.
    #[instrument(skip(self, item), fields(source = item.source()))]
    pub fn load(&mut self, item: AudioItem, play_when_ready: Option<bool>) -> Result<()> {
        self.ensure_alive()?;
        let Some(index) = self.current_index() else {
            return self.add(vec![item], None, play_when_ready);
        };

        if let Some(play) = play_when_ready {
            self.engine.set_play_when_ready(play);
        }
        let source = self.engine_source(&item);
        self.engine.replace_source(index, source)?;
        self.queue.replace(index, item);
        self.state.clear_stop();
        self.engine.prepare()?;

        debug!(index, "Current item replaced");
        self.refresh_item_metadata();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.remove_many(&[index])
    }

    /// Remove several entries. Indices may come in any order and may repeat;
    /// nothing is removed if any of them is out of range.
    ///
    /// Adjacent indices reach the engine as one range, highest range first.
    /// If the engine rejects a range, the ranges before it stay removed and
    /// the queue still mirrors the engine timeline.
    #[instrument(skip(self))]
    pub fn remove_many(&mut self, indices: &[usize]) -> Result<()> {
        self.ensure_alive()?;
        let order = self.queue.removal_order(indices)?;
        let current_removed = self
            .current_index()
            .is_some_and(|current| order.contains(&current));

        for range in descending_runs(&order) {
            if let Err(e) = self.engine.remove_sources(range.clone()) {
                warn!(?range, len = self.queue.len(), "Engine rejected removal");
                if current_removed {
                    self.refresh_item_metadata();
                }
                return Err(e.into());
            }
            for index in range.rev() {
                self.queue.remove(index);
            }
        }

        debug!(len = self.queue.len(), current_removed, "Items removed");
        if current_removed {
            self.refresh_item_metadata();
        }
        Ok(())
    }

    /// Move the entry at `from` to `to`. `to` past the end means the last
    /// slot; negative `to` is rejected.
    #[instrument(skip(self))]
    pub fn move_item(&mut self, from: usize, to: isize) -> Result<()> {
        self.ensure_alive()?;
        self.queue.check_index(from)?;
        let to = self.queue.move_target(to)?;
        if from == to {
            return Ok(());
        }

        self.engine.move_source(from, to)?;
        self.queue.move_item(from, to);
        Ok(())
    }

    /// Skip to the next item. Wraps to the first item in [`RepeatMode::All`].
    #[instrument(skip(self))]
    pub fn next(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let current = self.current_index().ok_or(PlaybackError::NoItemLoaded)?;
        let target = if current + 1 < self.queue.len() {
            current + 1
        } else if self.repeat_mode == RepeatMode::All {
            0
        } else {
            return Err(PlaybackError::NoNextItem);
        };

        self.skip_to(target, PlaybackEndedReason::SkippedToNext)
    }

    /// Skip to the previous item. Wraps to the last item in [`RepeatMode::All`].
    #[instrument(skip(self))]
    pub fn previous(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let current = self.current_index().ok_or(PlaybackError::NoItemLoaded)?;
        let target = if current > 0 {
            current - 1
        } else if self.repeat_mode == RepeatMode::All {
            self.queue.len() - 1
        } else {
            return Err(PlaybackError::NoPreviousItem);
        };

        self.skip_to(target, PlaybackEndedReason::SkippedToPrevious)
    }

    #[instrument(skip(self))]
    pub fn jump_to_item(&mut self, index: usize, play_when_ready: Option<bool>) -> Result<()> {
        self.ensure_alive()?;
        self.queue.check_index(index)?;
        if let Some(play) = play_when_ready {
            self.engine.set_play_when_ready(play);
        }
        self.skip_to(index, PlaybackEndedReason::JumpedToIndex)
    }

    /// Remove every entry after the current one. A no-op on an empty queue.
    #[instrument(skip(self))]
    pub fn remove_upcoming_items(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let Some(current) = self.current_index() else {
            return Ok(());
        };
        let len = self.queue.len();
        if current + 1 < len {
            self.engine.remove_sources(current + 1..len)?;
            self.queue.truncate_after(current);
        }
        Ok(())
    }

    /// Remove every entry before the current one. A no-op on an empty queue.
    #[instrument(skip(self))]
    pub fn remove_previous_items(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let Some(current) = self.current_index() else {
            return Ok(());
        };
        if current > 0 {
            self.engine.remove_sources(0..current)?;
            self.queue.drain_before(current);
        }
        Ok(())
    }

    /// Substitute the item at `index`. The notification follows when it is
    /// the current item.
    #[instrument(skip(self, item), fields(source = item.source()))]
    pub fn replace_item(&mut self, index: usize, item: AudioItem) -> Result<()> {
        self.ensure_alive()?;
        self.queue.check_index(index)?;

        let source = self.engine_source(&item);
        self.engine.replace_source(index, source)?;
        self.queue.replace(index, item);

        if self.current_index() == Some(index) {
            self.refresh_item_metadata();
        }
        Ok(())
    }

    // ========================================================================
    // Queue Views
    // ========================================================================

    pub fn items(&self) -> &[AudioItem] {
        self.queue.items()
    }

    pub fn previous_items(&self) -> &[AudioItem] {
        self.queue.previous(self.current_index())
    }

    pub fn next_items(&self) -> &[AudioItem] {
        self.queue.upcoming(self.current_index())
    }

    pub fn current_item(&self) -> Option<&AudioItem> {
        self.current_index().and_then(|index| self.queue.get(index))
    }

    /// Current position in the queue, as reported by the engine.
    pub fn current_index(&self) -> Option<usize> {
        if self.destroyed {
            return None;
        }
        self.engine
            .current_index()
            .filter(|&index| index < self.queue.len())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn play(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.engine.set_play_when_ready(true);
        if !self.queue.is_empty() {
            self.state.clear_stop();
            self.engine.prepare()?;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.engine.set_play_when_ready(false);
        Ok(())
    }

    pub fn toggle_playing(&mut self) -> Result<()> {
        if self.play_when_ready() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Reset the engine and clear the queue. Settles at
    /// [`PlayerState::Stopped`].
    ///
    /// Callbacks the engine queued before the call are applied first so
    /// that `Stopped` is published after them.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.process_pending_events();
        self.engine.stop()?;
        self.engine.clear()?;
        self.queue.clear();
        self.wrapping_to_start = false;

        self.events
            .playback_end()
            .publish(PlaybackEndedReason::PlayerStopped);
        if let Some(state) = self.state.on_stop() {
            self.publish_state(state);
        }
        self.refresh_item_metadata();
        info!("Playback stopped");
        Ok(())
    }

    /// Empty the queue without resetting the engine.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.engine.clear()?;
        self.queue.clear();
        self.wrapping_to_start = false;
        self.refresh_item_metadata();
        Ok(())
    }

    /// Seek inside the current item.
    pub fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.ensure_alive()?;
        let current = self.current_index().ok_or(PlaybackError::NoItemLoaded)?;
        debug!(position_ms, "Seeking");
        self.engine.seek_to(current, position_ms)?;
        Ok(())
    }

    /// Seek relative to the playhead, clamped to the item bounds.
    pub fn seek_by(&mut self, offset_ms: i64) -> Result<()> {
        let mut target = self.engine.position_ms().saturating_add_signed(offset_ms);
        if let Some(duration) = self.duration_ms() {
            target = target.min(duration);
        }
        self.seek(target)
    }

    pub fn forward(&mut self) -> Result<()> {
        let step = i64::try_from(self.config.forward_interval_ms).unwrap_or(i64::MAX);
        self.seek_by(step)
    }

    pub fn rewind(&mut self) -> Result<()> {
        let step = i64::try_from(self.config.rewind_interval_ms).unwrap_or(i64::MAX);
        self.seek_by(-step)
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) -> Result<()> {
        if play_when_ready {
            self.play()
        } else {
            self.pause()
        }
    }

    pub fn play_when_ready(&self) -> bool {
        !self.destroyed && self.engine.play_when_ready()
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.destroyed {
            return;
        }
        debug!(mode = mode.name(), "Repeat mode changed");
        self.repeat_mode = mode;
        self.engine.set_stop_at_item_end(mode == RepeatMode::One);
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Set output volume in `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_alive()?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.engine.set_volume(volume)?;
        self.volume = volume;
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_playback_speed(&mut self, speed: f32) -> Result<()> {
        self.ensure_alive()?;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlaybackError::InvalidArgument(format!(
                "playback speed must be positive, got {}",
                speed
            )));
        }
        self.engine.set_playback_speed(speed)?;
        self.playback_speed = speed;
        Ok(())
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    // ========================================================================
    // Engine Queries
    // ========================================================================

    pub fn position_ms(&self) -> u64 {
        if self.destroyed {
            return 0;
        }
        self.engine.position_ms()
    }

    /// Duration of the current item: the engine's value, or the item's
    /// nominal duration while the engine does not know it yet.
    pub fn duration_ms(&self) -> Option<u64> {
        if self.destroyed {
            return None;
        }
        self.engine
            .duration_ms()
            .or_else(|| self.current_item().and_then(AudioItem::get_duration_ms))
    }

    pub fn buffered_position_ms(&self) -> u64 {
        if self.destroyed {
            return 0;
        }
        self.engine.buffered_position_ms()
    }

    pub fn is_playing(&self) -> bool {
        !self.destroyed && self.engine.is_playing()
    }

    pub fn player_state(&self) -> PlayerState {
        self.state.state()
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    pub fn event_hub(&self) -> &EventHub {
        &self.events
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Sender for OS session hosts that deliver callbacks themselves.
    pub fn callback_sender(&self) -> CallbackSender {
        self.sender.clone()
    }

    pub fn cache(&self) -> Option<&Arc<SimpleCache>> {
        self.cache.as_ref()
    }

    pub fn notification_manager(&self) -> &NotificationManager {
        &self.notification
    }

    pub fn notification_manager_mut(&mut self) -> &mut NotificationManager {
        &mut self.notification
    }

    /// Create the system notification and sync it with the current item and
    /// state.
    pub fn create_notification(&mut self, config: NotificationConfig) -> Result<()> {
        self.ensure_alive()?;
        let metadata = self.current_metadata();
        self.notification.update_metadata(metadata)?;
        self.notification.update_state(
            self.state.state(),
            self.engine.position_ms(),
            self.duration_ms(),
        )?;
        self.notification.create_notification(config)?;
        Ok(())
    }

    // ========================================================================
    // Callback Processing
    // ========================================================================

    /// Apply every queued host callback. Returns how many were handled.
    ///
    /// Failures of individual callbacks (a `Next` command on the last item,
    /// for example) are logged and do not stop the drain.
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while !self.destroyed {
            let Some(callback) = self.callbacks.try_recv() else {
                break;
            };
            if let Err(e) = self.handle_event(callback) {
                warn!(error = %e, "Failed to apply host callback");
            }
            handled += 1;
        }
        handled
    }

    /// Wait for the next host callback and apply it.
    ///
    /// Returns `None` once the player is destroyed.
    pub async fn next_event(&mut self) -> Option<Result<()>> {
        if self.destroyed {
            return None;
        }
        let callback = self.callbacks.recv().await?;
        Some(self.handle_event(callback))
    }

    /// Apply a single host callback.
    pub fn handle_event(&mut self, callback: HostCallback) -> Result<()> {
        self.ensure_alive()?;
        match callback {
            HostCallback::Engine(event) => self.handle_engine_event(event),
            HostCallback::Session(event) => self.handle_session_event(event),
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::PlaybackStateChanged(engine_state) => {
                let play_when_ready = self.engine.play_when_ready();
                if let Some(state) = self.state.on_engine_state(engine_state, play_when_ready) {
                    self.publish_state(state);
                    if engine_state == EngineState::Ended {
                        return self.on_item_ended();
                    }
                }
            }
            EngineEvent::IsPlayingChanged(is_playing) => {
                if let Some(state) = self.state.on_is_playing(is_playing) {
                    self.publish_state(state);
                }
            }
            EngineEvent::MediaItemTransition {
                reason,
                old_position_ms,
            } => {
                let wrapped = std::mem::take(&mut self.wrapping_to_start);
                let published = if wrapped && reason == EngineTransitionReason::Seek {
                    TransitionReason::Auto { old_position_ms }
                } else {
                    if reason == EngineTransitionReason::Auto {
                        self.events
                            .playback_end()
                            .publish(PlaybackEndedReason::PlayedUntilEnd);
                    }
                    transition_reason(reason, old_position_ms)
                };
                debug!(reason = ?published, index = ?self.current_index(), "Item transition");
                self.events.item_transition().publish(published);
                self.refresh_item_metadata();
            }
            EngineEvent::PositionDiscontinuity {
                reason,
                old_position_ms,
                new_position_ms,
            } => {
                self.events.position_changed().publish(position_reason(
                    reason,
                    old_position_ms,
                    new_position_ms,
                ));
            }
            EngineEvent::MetadataParsed(parsed) => {
                self.events
                    .playback_metadata()
                    .publish(PlaybackMetadata::from(&parsed));
                if let Err(e) = self.notification.update_stream_metadata(&parsed) {
                    warn!(error = %e, "Failed to apply stream metadata to notification");
                }
            }
            EngineEvent::PlayerError(error) => {
                warn!(code = %error.code, message = %error.message, "Engine reported an error");
                if let Some(state) = self.state.on_error() {
                    self.publish_state(state);
                }
                self.events.playback_error().publish(PlaybackErrorEvent {
                    code: Some(error.code),
                    message: error.message,
                });
                self.events.playback_end().publish(PlaybackEndedReason::Failed);
            }
        }
        Ok(())
    }

    /// Apply repeat policy once the engine reports the end of an item.
    fn on_item_ended(&mut self) -> Result<()> {
        let Some(current) = self.current_index() else {
            return Ok(());
        };
        self.events
            .playback_end()
            .publish(PlaybackEndedReason::PlayedUntilEnd);

        let old_position_ms = self.engine.position_ms();
        match self.repeat_mode {
            RepeatMode::Off => {
                debug!(index = current, "Queue ended");
            }
            RepeatMode::One => {
                self.engine.seek_to(current, 0)?;
                self.events
                    .item_transition()
                    .publish(TransitionReason::Repeat { old_position_ms });
            }
            RepeatMode::All if current + 1 == self.queue.len() => {
                if current == 0 {
                    // Single item: the engine reports no transition for a
                    // seek within the same item.
                    self.events
                        .item_transition()
                        .publish(TransitionReason::Auto { old_position_ms });
                } else {
                    self.wrapping_to_start = true;
                }
                self.engine.seek_to(0, 0)?;
            }
            RepeatMode::All => {}
        }
        Ok(())
    }

    fn handle_session_event(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Transport(action) => {
                if self.config.intercept_external_actions {
                    debug!(action = action.name(), "Forwarding external action");
                    self.events.external_action().publish(action);
                    Ok(())
                } else {
                    self.apply_external_action(action)
                }
            }
            SessionEvent::AudioFocusChanged(focus) => self.on_audio_focus_changed(focus),
            SessionEvent::AudioBecomingNoisy => {
                if self.config.handle_audio_becoming_noisy {
                    debug!("Audio becoming noisy, pausing");
                    self.pause()?;
                }
                Ok(())
            }
            SessionEvent::NotificationDismissed => {
                self.notification.hide_notification()?;
                Ok(())
            }
        }
    }

    fn apply_external_action(&mut self, action: MediaSessionCallback) -> Result<()> {
        debug!(action = action.name(), "Executing external action");
        match action {
            MediaSessionCallback::Play => self.play(),
            MediaSessionCallback::Pause => self.pause(),
            MediaSessionCallback::Next => self.next(),
            MediaSessionCallback::Previous => self.previous(),
            MediaSessionCallback::Forward => self.forward(),
            MediaSessionCallback::Rewind => self.rewind(),
            MediaSessionCallback::Stop => self.stop(),
            MediaSessionCallback::Seek(position_ms) => self.seek(position_ms),
            // Ratings have no playback effect; the application decides.
            rating @ MediaSessionCallback::Rating(_) => {
                self.events.external_action().publish(rating);
                Ok(())
            }
        }
    }

    fn on_audio_focus_changed(&mut self, focus: FocusChangeData) -> Result<()> {
        self.events.audio_focus_changed().publish(focus);
        if !self.config.handle_audio_focus {
            return Ok(());
        }

        if focus.is_paused {
            self.resume_on_focus_gain =
                !focus.is_focus_lost_permanently && self.engine.play_when_ready();
            debug!(
                permanent = focus.is_focus_lost_permanently,
                "Audio focus lost, pausing"
            );
            self.pause()
        } else if std::mem::take(&mut self.resume_on_focus_gain) {
            debug!("Audio focus regained, resuming");
            self.play()
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release the engine, the notification and this player's cache handle.
    ///
    /// The process-wide cache stays registered for other players; use
    /// [`CacheProvider::release`] to drop it. Later calls are no-ops and every
    /// other operation returns [`PlaybackError::Destroyed`].
    #[instrument(skip(self))]
    pub fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.engine.release();
        self.queue.clear();
        self.cache = None;
        info!("Queued audio player destroyed");
        self.notification.destroy()?;
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(PlaybackError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn engine_source(&self, item: &AudioItem) -> EngineSource {
        let cache = self
            .cache
            .as_ref()
            .map(|cache| Arc::clone(cache) as Arc<dyn MediaCache>);
        item.to_engine_source(self.config.user_agent.as_deref(), cache)
    }

    fn skip_to(&mut self, index: usize, reason: PlaybackEndedReason) -> Result<()> {
        self.engine.seek_to(index, 0)?;
        self.events.playback_end().publish(reason);
        self.state.clear_stop();
        self.engine.prepare()?;
        Ok(())
    }

    fn current_metadata(&self) -> NotificationMetadata {
        self.current_item()
            .map(AudioItem::to_notification_metadata)
            .unwrap_or_default()
    }

    fn publish_state(&mut self, state: PlayerState) {
        debug!(state = state.description(), "Player state changed");
        self.events.state_change().publish(state);
        let (position_ms, duration_ms) = (self.engine.position_ms(), self.duration_ms());
        if let Err(e) = self.notification.update_state(state, position_ms, duration_ms) {
            warn!(error = %e, "Failed to update notification state");
        }
    }

    fn refresh_item_metadata(&mut self) {
        let metadata = self.current_metadata();
        if let Err(e) = self.notification.update_metadata(metadata) {
            warn!(error = %e, "Failed to update notification metadata");
        }
    }
}

impl fmt::Debug for QueuedAudioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedAudioPlayer")
            .field("queue_len", &self.queue.len())
            .field("current_index", &self.current_index())
            .field("state", &self.state.state())
            .field("repeat_mode", &self.repeat_mode)
            .field("cached", &self.cache.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
