//! # Event Hub
//!
//! Typed broadcast channels that decouple the player's callback processing
//! from application consumers, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The hub owns one [`EventChannel`] per concern:
//!
//! | Channel | Payload | Replay |
//! |---------|---------|--------|
//! | `state_change` | [`PlayerState`] | latest value |
//! | `item_transition` | [`TransitionReason`] | none |
//! | `playback_end` | [`PlaybackEndedReason`] | none |
//! | `position_changed` | [`PositionChangedReason`] | none |
//! | `audio_focus_changed` | [`FocusChangeData`] | none |
//! | `playback_metadata` | [`PlaybackMetadata`] | none |
//! | `playback_error` | [`PlaybackErrorEvent`] | none |
//! | `notification_state` | [`NotificationState`] | none |
//! | `external_action` | [`MediaSessionCallback`] | none |
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventHub, PlayerState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hub = EventHub::new(16);
//! hub.state_change().publish(PlayerState::Loading);
//!
//! // Subscribed after the publish, but the state channel replays the latest value.
//! let mut states = hub.state_change().subscribe();
//! assert_eq!(states.recv().await.unwrap(), PlayerState::Loading);
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Receivers surface the `tokio::sync::broadcast` errors unchanged:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal.
//! - **`RecvError::Closed`**: the hub was dropped. Treat as shutdown.
//!
//! Publishing never blocks and never fails; with no subscribers the value is
//! dropped (but still recorded for replay channels).

use bridge_traits::engine::ParsedMetadata;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

pub use bridge_traits::session::{FocusChangeData, MediaSessionCallback};
pub use tokio::sync::broadcast::error::RecvError;

/// Default buffer size for every hub channel.
///
/// Subscribers that fall further behind than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Player state as projected from engine callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No source prepared, or the engine dropped back to idle after an error.
    Idle,
    /// Buffering while not intending to play.
    Loading,
    /// Buffering while intending to play.
    Buffering,
    /// Enough media buffered to start.
    Ready,
    Playing,
    Paused,
    /// Explicitly stopped by the application.
    Stopped,
    /// The last item finished and nothing follows.
    Ended,
    /// The engine reported a playback error.
    Error,
}

impl PlayerState {
    /// Returns `true` while media is loading or buffering.
    pub fn is_loading(&self) -> bool {
        matches!(self, PlayerState::Loading | PlayerState::Buffering)
    }

    /// States that a late `is_playing == false` callback must not overwrite.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerState::Idle | PlayerState::Stopped | PlayerState::Ended | PlayerState::Error
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Loading => "Loading",
            PlayerState::Buffering => "Buffering",
            PlayerState::Ready => "Ready to play",
            PlayerState::Playing => "Playing",
            PlayerState::Paused => "Paused",
            PlayerState::Stopped => "Stopped",
            PlayerState::Ended => "Playback ended",
            PlayerState::Error => "Playback error",
        }
    }
}

/// Why the current queue item changed. Carries the playback position in the
/// previous item at the moment of the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum TransitionReason {
    /// The previous item played to its end.
    Auto { old_position_ms: u64 },
    /// The application seeked or skipped to another item.
    SeekToAnotherItem { old_position_ms: u64 },
    /// The same item started over because of repeat mode.
    Repeat { old_position_ms: u64 },
    /// The queue was mutated underneath the current item.
    QueueChanged { old_position_ms: u64 },
}

impl TransitionReason {
    pub fn old_position_ms(&self) -> u64 {
        match self {
            TransitionReason::Auto { old_position_ms }
            | TransitionReason::SeekToAnotherItem { old_position_ms }
            | TransitionReason::Repeat { old_position_ms }
            | TransitionReason::QueueChanged { old_position_ms } => *old_position_ms,
        }
    }
}

/// Why playback of an item stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEndedReason {
    PlayedUntilEnd,
    PlayerStopped,
    SkippedToNext,
    SkippedToPrevious,
    JumpedToIndex,
    Failed,
}

/// Why the playback position changed discontinuously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum PositionChangedReason {
    AutoTransition { old_position_ms: u64, new_position_ms: u64 },
    QueueChanged { old_position_ms: u64, new_position_ms: u64 },
    SeekTo { old_position_ms: u64, new_position_ms: u64 },
    /// The engine could not land exactly on the requested position.
    SeekFailed { old_position_ms: u64, new_position_ms: u64 },
    SkippedPeriod { old_position_ms: u64, new_position_ms: u64 },
    Unknown { old_position_ms: u64, new_position_ms: u64 },
}

/// Metadata extracted from the media stream (ICY, ID3, Vorbis comments...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackMetadata {
    /// Container format the metadata came from, e.g. `"id3"` or `"icy"`.
    pub source: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub url: Option<String>,
}

impl From<&ParsedMetadata> for PlaybackMetadata {
    fn from(parsed: &ParsedMetadata) -> Self {
        use bridge_traits::engine::MetadataFormat;

        let source = match parsed.format {
            Some(MetadataFormat::Id3) => "id3",
            Some(MetadataFormat::Icy) => "icy",
            Some(MetadataFormat::VorbisComment) => "vorbis-comment",
            Some(MetadataFormat::QuickTime) => "quicktime",
            None => "unknown",
        };

        Self {
            source: source.to_string(),
            title: parsed.title.clone(),
            artist: parsed.artist.clone(),
            album: parsed.album.clone(),
            date: parsed.date.clone(),
            genre: parsed.genre.clone(),
            url: parsed.url.clone(),
        }
    }
}

/// Lifecycle of the system transport notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Posted,
    Cancelled,
}

/// Playback error surfaced from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackErrorEvent {
    pub code: Option<String>,
    pub message: String,
}

// ============================================================================
// Event Channel
// ============================================================================

/// A broadcast channel with an optional replay buffer.
///
/// With `replay_depth == 0` it behaves like a plain `broadcast` channel: new
/// subscribers only see values published after they subscribed. With a
/// non-zero depth the last `replay_depth` values are handed to every new
/// subscriber before live values. Cloning yields another handle to the same
/// channel.
pub struct EventChannel<T> {
    sender: broadcast::Sender<T>,
    replay: Option<Arc<Mutex<ReplayBuffer<T>>>>,
}

struct ReplayBuffer<T> {
    depth: usize,
    values: VecDeque<T>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            replay: self.replay.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    /// Create a channel buffering `capacity` values per subscriber and
    /// replaying the last `replay_depth` values to new subscribers.
    pub fn new(capacity: usize, replay_depth: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let replay = (replay_depth > 0).then(|| {
            Arc::new(Mutex::new(ReplayBuffer {
                depth: replay_depth,
                values: VecDeque::with_capacity(replay_depth),
            }))
        });
        Self { sender, replay }
    }

    /// Publish `value` to every current subscriber.
    ///
    /// Returns the number of subscribers the value was delivered to.
    pub fn publish(&self, value: T) -> usize {
        match &self.replay {
            Some(replay) => {
                // Hold the replay lock across the send so a concurrent
                // subscribe sees the value either replayed or live, never both.
                let mut buffer = replay.lock();
                buffer.values.push_back(value.clone());
                while buffer.values.len() > buffer.depth {
                    buffer.values.pop_front();
                }
                self.sender.send(value).unwrap_or(0)
            }
            None => self.sender.send(value).unwrap_or(0),
        }
    }

    /// Subscribe to future values (preceded by the replay buffer, if any).
    pub fn subscribe(&self) -> EventReceiver<T> {
        match &self.replay {
            Some(replay) => {
                let buffer = replay.lock();
                EventReceiver::new(self.sender.subscribe(), buffer.values.clone())
            }
            None => EventReceiver::new(self.sender.subscribe(), VecDeque::new()),
        }
    }

    /// Most recently published value, when the channel replays.
    pub fn latest(&self) -> Option<T> {
        self.replay
            .as_ref()
            .and_then(|replay| replay.lock().values.back().cloned())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscriber_count", &self.sender.receiver_count())
            .field("replays", &self.replay.is_some())
            .finish()
    }
}

/// Type alias for receiver filter functions.
type EventFilter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Receiving end of an [`EventChannel`].
pub struct EventReceiver<T> {
    replayed: VecDeque<T>,
    receiver: broadcast::Receiver<T>,
    filter: Option<EventFilter<T>>,
}

impl<T: Clone> EventReceiver<T> {
    fn new(receiver: broadcast::Receiver<T>, replayed: VecDeque<T>) -> Self {
        Self {
            replayed,
            receiver,
            filter: None,
        }
    }

    /// Only yield values matching `predicate`. Applies to replayed values too.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, value: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f(value))
    }

    /// Receive the next value that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` values.
    /// Returns `RecvError::Closed` if the channel was dropped.
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        while let Some(value) = self.replayed.pop_front() {
            if self.accepts(&value) {
                return Ok(value);
            }
        }

        loop {
            let value = self.receiver.recv().await?;
            if self.accepts(&value) {
                return Ok(value);
            }
        }
    }

    /// Receive without waiting. Returns `None` if nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<T, RecvError>> {
        while let Some(value) = self.replayed.pop_front() {
            if self.accepts(&value) {
                return Some(Ok(value));
            }
        }

        loop {
            match self.receiver.try_recv() {
                Ok(value) => {
                    if self.accepts(&value) {
                        return Some(Ok(value));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drain everything currently queued, skipping lag notifications.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(value) => values.push(value),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        values
    }
}

impl<T> fmt::Debug for EventReceiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReceiver")
            .field("pending_replay", &self.replayed.len())
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Event Hub
// ============================================================================

/// The set of channels the player publishes to.
///
/// Cloning is cheap and every clone publishes to the same subscribers.
#[derive(Clone, Debug)]
pub struct EventHub {
    state_change: EventChannel<PlayerState>,
    item_transition: EventChannel<TransitionReason>,
    playback_end: EventChannel<PlaybackEndedReason>,
    position_changed: EventChannel<PositionChangedReason>,
    audio_focus_changed: EventChannel<FocusChangeData>,
    playback_metadata: EventChannel<PlaybackMetadata>,
    playback_error: EventChannel<PlaybackErrorEvent>,
    notification_state: EventChannel<NotificationState>,
    external_action: EventChannel<MediaSessionCallback>,
}

impl EventHub {
    /// Create a hub whose channels buffer `capacity` values per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            state_change: EventChannel::new(capacity, 1),
            item_transition: EventChannel::new(capacity, 0),
            playback_end: EventChannel::new(capacity, 0),
            position_changed: EventChannel::new(capacity, 0),
            audio_focus_changed: EventChannel::new(capacity, 0),
            playback_metadata: EventChannel::new(capacity, 0),
            playback_error: EventChannel::new(capacity, 0),
            notification_state: EventChannel::new(capacity, 0),
            external_action: EventChannel::new(capacity, 0),
        }
    }

    /// Player state; new subscribers immediately receive the latest state.
    pub fn state_change(&self) -> &EventChannel<PlayerState> {
        &self.state_change
    }

    pub fn item_transition(&self) -> &EventChannel<TransitionReason> {
        &self.item_transition
    }

    pub fn playback_end(&self) -> &EventChannel<PlaybackEndedReason> {
        &self.playback_end
    }

    pub fn position_changed(&self) -> &EventChannel<PositionChangedReason> {
        &self.position_changed
    }

    pub fn audio_focus_changed(&self) -> &EventChannel<FocusChangeData> {
        &self.audio_focus_changed
    }

    pub fn playback_metadata(&self) -> &EventChannel<PlaybackMetadata> {
        &self.playback_metadata
    }

    pub fn playback_error(&self) -> &EventChannel<PlaybackErrorEvent> {
        &self.playback_error
    }

    pub fn notification_state(&self) -> &EventChannel<NotificationState> {
        &self.notification_state
    }

    /// Transport commands from outside the app, when the player is configured
    /// to intercept them instead of acting on them.
    pub fn external_action(&self) -> &EventChannel<MediaSessionCallback> {
        &self.external_action
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_creation() {
        let channel: EventChannel<u32> = EventChannel::new(10, 0);
        assert_eq!(channel.subscriber_count(), 0);
        assert_eq!(channel.latest(), None);
    }

    #[tokio::test]
    async fn test_channel_subscription() {
        let channel: EventChannel<u32> = EventChannel::new(10, 0);
        let _sub1 = channel.subscribe();
        let _sub2 = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let hub = EventHub::new(10);
        assert_eq!(hub.playback_end().publish(PlaybackEndedReason::Failed), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let hub = EventHub::new(10);
        let mut sub1 = hub.item_transition().subscribe();
        let mut sub2 = hub.item_transition().subscribe();

        let reason = TransitionReason::Auto {
            old_position_ms: 183_000,
        };
        assert_eq!(hub.item_transition().publish(reason), 2);

        assert_eq!(sub1.recv().await.unwrap(), reason);
        assert_eq!(sub2.recv().await.unwrap(), reason);
    }

    #[tokio::test]
    async fn test_state_replays_latest_to_late_subscriber() {
        let hub = EventHub::new(10);
        hub.state_change().publish(PlayerState::Loading);
        hub.state_change().publish(PlayerState::Ready);
        hub.state_change().publish(PlayerState::Playing);

        let mut late = hub.state_change().subscribe();
        assert_eq!(late.recv().await.unwrap(), PlayerState::Playing);
        assert!(late.try_recv().is_none());

        hub.state_change().publish(PlayerState::Paused);
        assert_eq!(late.recv().await.unwrap(), PlayerState::Paused);
        assert_eq!(hub.state_change().latest(), Some(PlayerState::Paused));
    }

    #[tokio::test]
    async fn test_plain_channel_does_not_replay() {
        let hub = EventHub::new(10);
        hub.notification_state().publish(NotificationState::Posted);

        let mut late = hub.notification_state().subscribe();
        assert!(late.try_recv().is_none());
        assert_eq!(hub.notification_state().latest(), None);
    }

    #[tokio::test]
    async fn test_replay_depth_keeps_last_values() {
        let channel: EventChannel<u32> = EventChannel::new(10, 2);
        for i in 0..5 {
            channel.publish(i);
        }
        let mut sub = channel.subscribe();
        assert_eq!(sub.drain(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_receiver_with_filter() {
        let hub = EventHub::new(10);
        let mut stream = hub
            .state_change()
            .subscribe()
            .filter(|state| state.is_loading());

        hub.state_change().publish(PlayerState::Idle);
        hub.state_change().publish(PlayerState::Buffering);

        assert_eq!(stream.recv().await.unwrap(), PlayerState::Buffering);
    }

    #[tokio::test]
    async fn test_per_channel_order_is_publish_order() {
        let hub = EventHub::new(32);
        let mut sub = hub.playback_end().subscribe();

        let published = [
            PlaybackEndedReason::SkippedToNext,
            PlaybackEndedReason::PlayedUntilEnd,
            PlaybackEndedReason::JumpedToIndex,
            PlaybackEndedReason::PlayerStopped,
        ];
        for reason in published {
            hub.playback_end().publish(reason);
        }

        assert_eq!(sub.drain(), published.to_vec());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let channel: EventChannel<u64> = EventChannel::new(2, 0);
        let mut sub = channel.subscribe();

        for i in 0..5 {
            channel.publish(i);
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
        // Still usable after lagging.
        assert_eq!(sub.recv().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let hub = EventHub::new(100);
        let mut sub = hub.external_action().subscribe();

        let hub1 = hub.clone();
        let hub2 = hub.clone();

        let handle1 = tokio::spawn(async move {
            for _ in 0..10 {
                hub1.external_action().publish(MediaSessionCallback::Next);
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                hub2.external_action()
                    .publish(MediaSessionCallback::Seek(i * 1000));
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        assert_eq!(sub.drain().len(), 20);
    }

    #[tokio::test]
    async fn test_closed_after_hub_dropped() {
        let hub = EventHub::new(4);
        let mut sub = hub.playback_error().subscribe();
        drop(hub);
        assert!(matches!(sub.recv().await, Err(RecvError::Closed)));
    }

    #[test]
    fn test_event_serialization() {
        let reason = PositionChangedReason::SeekTo {
            old_position_ms: 1_000,
            new_position_ms: 42_000,
        };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("SeekTo"));
        let back: PositionChangedReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);

        let state = serde_json::to_string(&PlayerState::Buffering).unwrap();
        assert_eq!(state, "\"buffering\"");
    }

    #[test]
    fn test_playback_metadata_from_parsed() {
        let parsed = ParsedMetadata {
            format: Some(bridge_traits::engine::MetadataFormat::Icy),
            title: Some("Morning Show".into()),
            url: Some("https://radio.example".into()),
            ..Default::default()
        };
        let meta = PlaybackMetadata::from(&parsed);
        assert_eq!(meta.source, "icy");
        assert_eq!(meta.title.as_deref(), Some("Morning Show"));
        assert_eq!(meta.artist, None);
    }

    #[test]
    fn test_transition_reason_position() {
        let reason = TransitionReason::Repeat {
            old_position_ms: 215_000,
        };
        assert_eq!(reason.old_position_ms(), 215_000);
        assert!(PlayerState::Ended.is_terminal());
        assert!(!PlayerState::Paused.is_terminal());
    }
}
