//! In-memory media engine
//!
//! [`HeadlessEngine`] keeps a timeline of sources and a playhead but renders
//! nothing. It reports callbacks in the order a native engine does, which
//! makes it usable both for CI and for hosts without audio output.
//!
//! Time does not pass on its own: drive the playhead with
//! [`HeadlessEngine::advance`] and [`HeadlessEngine::finish_current_item`].

use bridge_traits::{
    callback::CallbackSender,
    engine::{
        DiscontinuityReason, EngineError, EngineEvent, EngineOptions, EngineSource, EngineState,
        EngineTransitionReason, MediaEngine, ParsedMetadata,
    },
    error::{BridgeError, Result},
    session::SessionEvent,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, trace};

/// Headless [`MediaEngine`].
///
/// Clones share the same timeline, so a test can hand one clone to the
/// player and keep another to simulate playback.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEngine {
    inner: Arc<Mutex<EngineInner>>,
}

#[derive(Debug)]
struct EngineInner {
    sources: Vec<EngineSource>,
    current: Option<usize>,
    state: EngineState,
    play_when_ready: bool,
    is_playing: bool,
    stop_at_item_end: bool,
    position_ms: u64,
    speed: f32,
    volume: f32,
    options: Option<EngineOptions>,
    durations: HashMap<String, u64>,
    callbacks: Option<CallbackSender>,
    released: bool,
}

impl Default for EngineInner {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            current: None,
            state: EngineState::Idle,
            play_when_ready: false,
            is_playing: false,
            stop_at_item_end: false,
            position_ms: 0,
            speed: 1.0,
            volume: 1.0,
            options: None,
            durations: HashMap::new(),
            callbacks: None,
            released: false,
        }
    }
}

impl EngineInner {
    fn emit(&self, event: EngineEvent) {
        trace!(?event, "Headless engine callback");
        if let Some(callbacks) = &self.callbacks {
            if callbacks.engine(event).is_err() {
                debug!("Callback receiver dropped, engine event discarded");
            }
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.released {
            Err(BridgeError::Released)
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.sources.len() {
            Ok(())
        } else {
            Err(BridgeError::TimelineIndex {
                index,
                size: self.sources.len(),
            })
        }
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            self.state = state;
            self.emit(EngineEvent::PlaybackStateChanged(state));
        }
        self.update_is_playing();
    }

    fn update_is_playing(&mut self) {
        let playing = self.play_when_ready && self.state == EngineState::Ready;
        if playing != self.is_playing {
            self.is_playing = playing;
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    /// Buffer the current source again after it changed or the playhead moved.
    fn rebuffer(&mut self) {
        if self.state == EngineState::Idle {
            return;
        }
        if self.sources.is_empty() {
            self.set_state(EngineState::Ended);
            return;
        }
        self.set_state(EngineState::Buffering);
        self.set_state(EngineState::Ready);
    }

    fn current_duration(&self) -> Option<u64> {
        let index = self.current?;
        let source = self.sources.get(index)?;
        self.durations.get(&source.uri).copied()
    }

    fn transition(&mut self, to: Option<usize>, reason: EngineTransitionReason) {
        let old_position_ms = self.position_ms;
        self.current = to;
        self.position_ms = 0;
        self.emit(EngineEvent::MediaItemTransition {
            reason,
            old_position_ms,
        });
    }
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the duration reported for sources with `uri`.
    pub fn set_duration(&self, uri: impl Into<String>, duration_ms: u64) {
        self.inner.lock().durations.insert(uri.into(), duration_ms);
    }

    /// Move the playhead forward without crossing the end of the source.
    pub fn advance(&self, ms: u64) {
        let mut inner = self.inner.lock();
        let target = inner.position_ms.saturating_add(ms);
        inner.position_ms = match inner.current_duration() {
            Some(duration) => target.min(duration),
            None => target,
        };
    }

    /// Play the current source to its end.
    ///
    /// Advances to the next source with an `Auto` transition, or reports
    /// `Ended` on the last source (and on every source while stop-at-item-end
    /// is set).
    pub fn finish_current_item(&self) {
        let mut inner = self.inner.lock();
        let Some(current) = inner.current else {
            return;
        };
        if let Some(duration) = inner.current_duration() {
            inner.position_ms = duration;
        }

        let has_next = current + 1 < inner.sources.len();
        if has_next && !inner.stop_at_item_end {
            let old_position_ms = inner.position_ms;
            inner.transition(Some(current + 1), EngineTransitionReason::Auto);
            inner.emit(EngineEvent::PositionDiscontinuity {
                reason: DiscontinuityReason::AutoTransition,
                old_position_ms,
                new_position_ms: 0,
            });
        } else {
            inner.set_state(EngineState::Ended);
        }
    }

    /// Report a stall while playing.
    pub fn simulate_buffering(&self) {
        let mut inner = self.inner.lock();
        if inner.state != EngineState::Idle {
            inner.set_state(EngineState::Buffering);
        }
    }

    /// Report that enough media is buffered again.
    pub fn simulate_ready(&self) {
        let mut inner = self.inner.lock();
        if inner.state != EngineState::Idle {
            inner.set_state(EngineState::Ready);
        }
    }

    /// Fail the current source. The engine drops back to idle.
    pub fn simulate_error(&self, error: EngineError) {
        let mut inner = self.inner.lock();
        inner.emit(EngineEvent::PlayerError(error));
        inner.set_state(EngineState::Idle);
    }

    /// Report metadata found in the stream (ICY title, ID3 frame...).
    pub fn emit_metadata(&self, metadata: ParsedMetadata) {
        self.inner.lock().emit(EngineEvent::MetadataParsed(metadata));
    }

    /// Deliver an OS session callback through the engine's callback channel.
    pub fn emit_session_event(&self, event: SessionEvent) -> Result<()> {
        let inner = self.inner.lock();
        match &inner.callbacks {
            Some(callbacks) => callbacks.session(event),
            None => Err(BridgeError::NotAvailable(
                "callback sender not installed".to_string(),
            )),
        }
    }

    pub fn state(&self) -> EngineState {
        self.inner.lock().state
    }

    /// URIs on the timeline, in order.
    pub fn source_uris(&self) -> Vec<String> {
        self.inner
            .lock()
            .sources
            .iter()
            .map(|source| source.uri.clone())
            .collect()
    }

    pub fn source_at(&self, index: usize) -> Option<EngineSource> {
        self.inner.lock().sources.get(index).cloned()
    }

    pub fn options(&self) -> Option<EngineOptions> {
        self.inner.lock().options
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }

    pub fn playback_speed(&self) -> f32 {
        self.inner.lock().speed
    }

    pub fn stops_at_item_end(&self) -> bool {
        self.inner.lock().stop_at_item_end
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().released
    }
}

impl MediaEngine for HeadlessEngine {
    fn set_callback_sender(&mut self, sender: CallbackSender) {
        self.inner.lock().callbacks = Some(sender);
    }

    fn configure(&mut self, options: EngineOptions) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        debug!(?options, "Configuring headless engine");
        inner.options = Some(options);
        Ok(())
    }

    fn add_sources(&mut self, index: usize, sources: Vec<EngineSource>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if index > inner.sources.len() {
            return Err(BridgeError::TimelineIndex {
                index,
                size: inner.sources.len(),
            });
        }

        let count = sources.len();
        if count == 0 {
            return Ok(());
        }
        inner.sources.splice(index..index, sources);

        match inner.current {
            None => {
                inner.transition(Some(0), EngineTransitionReason::PlaylistChanged);
                inner.rebuffer();
            }
            Some(current) if index <= current => inner.current = Some(current + count),
            Some(_) => {}
        }
        Ok(())
    }

    fn remove_sources(&mut self, range: Range<usize>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if range.start > range.end || range.end > inner.sources.len() {
            return Err(BridgeError::TimelineIndex {
                index: range.end,
                size: inner.sources.len(),
            });
        }
        if range.is_empty() {
            return Ok(());
        }

        let removed = range.len();
        inner.sources.drain(range.clone());

        let Some(current) = inner.current else {
            return Ok(());
        };

        if current >= range.end {
            inner.current = Some(current - removed);
        } else if current >= range.start {
            if inner.sources.is_empty() {
                inner.transition(None, EngineTransitionReason::PlaylistChanged);
                if inner.state != EngineState::Idle {
                    inner.set_state(EngineState::Ended);
                }
            } else {
                let next = range.start.min(inner.sources.len() - 1);
                let old_position_ms = inner.position_ms;
                inner.transition(Some(next), EngineTransitionReason::PlaylistChanged);
                inner.emit(EngineEvent::PositionDiscontinuity {
                    reason: DiscontinuityReason::Remove,
                    old_position_ms,
                    new_position_ms: 0,
                });
                inner.rebuffer();
            }
        }
        Ok(())
    }

    fn move_source(&mut self, from: usize, to: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.check_index(from)?;
        inner.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let source = inner.sources.remove(from);
        inner.sources.insert(to, source);

        if let Some(current) = inner.current {
            inner.current = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(())
    }

    fn replace_source(&mut self, index: usize, source: EngineSource) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.check_index(index)?;

        inner.sources[index] = source;
        if inner.current == Some(index) {
            inner.transition(Some(index), EngineTransitionReason::PlaylistChanged);
            inner.rebuffer();
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.sources.clear();
        if inner.current.is_some() {
            inner.transition(None, EngineTransitionReason::PlaylistChanged);
        }
        if inner.state != EngineState::Idle {
            inner.set_state(EngineState::Ended);
        }
        Ok(())
    }

    fn source_count(&self) -> usize {
        self.inner.lock().sources.len()
    }

    fn current_index(&self) -> Option<usize> {
        self.inner.lock().current
    }

    fn seek_to(&mut self, index: usize, position_ms: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.check_index(index)?;

        let old_position_ms = inner.position_ms;
        if inner.current != Some(index) {
            inner.transition(Some(index), EngineTransitionReason::Seek);
        }
        inner.position_ms = match inner.current_duration() {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };
        let new_position_ms = inner.position_ms;
        inner.emit(EngineEvent::PositionDiscontinuity {
            reason: DiscontinuityReason::Seek,
            old_position_ms,
            new_position_ms,
        });
        inner.rebuffer();
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if inner.state != EngineState::Idle {
            return Ok(());
        }
        if inner.sources.is_empty() {
            inner.set_state(EngineState::Ended);
            return Ok(());
        }
        inner.set_state(EngineState::Buffering);
        inner.set_state(EngineState::Ready);
        Ok(())
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        let mut inner = self.inner.lock();
        inner.play_when_ready = play_when_ready;
        inner.update_is_playing();
    }

    fn play_when_ready(&self) -> bool {
        self.inner.lock().play_when_ready
    }

    fn set_stop_at_item_end(&mut self, stop: bool) {
        self.inner.lock().stop_at_item_end = stop;
    }

    fn stop(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.set_state(EngineState::Idle);
        Ok(())
    }

    fn set_playback_speed(&mut self, speed: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.speed = speed;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.volume = volume;
        Ok(())
    }

    fn position_ms(&self) -> u64 {
        self.inner.lock().position_ms
    }

    fn duration_ms(&self) -> Option<u64> {
        self.inner.lock().current_duration()
    }

    fn buffered_position_ms(&self) -> u64 {
        let inner = self.inner.lock();
        match inner.state {
            EngineState::Ready | EngineState::Ended => {
                inner.current_duration().unwrap_or(inner.position_ms)
            }
            _ => inner.position_ms,
        }
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().is_playing
    }

    fn release(&mut self) {
        let mut inner = self.inner.lock();
        debug!("Releasing headless engine");
        inner.sources.clear();
        inner.current = None;
        inner.state = EngineState::Idle;
        inner.is_playing = false;
        inner.callbacks = None;
        inner.released = true;
    }
}
