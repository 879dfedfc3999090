//! # Playback State Machine
//!
//! Projects engine callbacks onto [`PlayerState`].
//!
//! ```text
//! Idle ─► Loading/Buffering ─► Ready ─► Playing ⇄ Paused ─► Ended
//!                  Stopped and Error are reachable from every state
//! ```
//!
//! State is never commanded directly. The only exception is `stop()`, which
//! settles at [`PlayerState::Stopped`] and keeps it when the engine confirms
//! with `Idle`. Only new work on the queue (`clear_stop`) lifts the stop;
//! engine callbacks never do. After an engine error the following `Idle` keeps
//! [`PlayerState::Error`] so subscribers can tell failures from stops.

use bridge_traits::engine::{DiscontinuityReason, EngineState, EngineTransitionReason};
use core_runtime::events::{PlayerState, PositionChangedReason, TransitionReason};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PlayerState,
    stopped: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            stopped: false,
        }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Apply an engine playback-state callback. Returns the new state when it
    /// changed.
    pub fn on_engine_state(
        &mut self,
        engine_state: EngineState,
        play_when_ready: bool,
    ) -> Option<PlayerState> {
        let next = match engine_state {
            EngineState::Buffering if play_when_ready => PlayerState::Buffering,
            EngineState::Buffering => PlayerState::Loading,
            EngineState::Ready => PlayerState::Ready,
            EngineState::Ended => PlayerState::Ended,
            EngineState::Idle if self.stopped => PlayerState::Stopped,
            EngineState::Idle if self.state == PlayerState::Error => PlayerState::Error,
            EngineState::Idle => PlayerState::Idle,
        };
        self.set(next)
    }

    /// Apply an engine is-playing callback.
    pub fn on_is_playing(&mut self, is_playing: bool) -> Option<PlayerState> {
        if is_playing {
            return self.set(PlayerState::Playing);
        }
        if self.state.is_terminal() {
            return None;
        }
        self.set(PlayerState::Paused)
    }

    pub fn on_error(&mut self) -> Option<PlayerState> {
        self.stopped = false;
        self.set(PlayerState::Error)
    }

    /// Explicit `stop()`.
    pub fn on_stop(&mut self) -> Option<PlayerState> {
        self.stopped = true;
        self.set(PlayerState::Stopped)
    }

    /// The queue was given new work; a later `Idle` means idle again.
    pub fn clear_stop(&mut self) {
        self.stopped = false;
    }

    fn set(&mut self, next: PlayerState) -> Option<PlayerState> {
        if self.state == next {
            return None;
        }
        trace!(from = ?self.state, to = ?next, "Player state transition");
        self.state = next;
        Some(next)
    }
}

/// Map an engine transition onto the published reason.
pub fn transition_reason(reason: EngineTransitionReason, old_position_ms: u64) -> TransitionReason {
    match reason {
        EngineTransitionReason::Auto => TransitionReason::Auto { old_position_ms },
        EngineTransitionReason::Seek => TransitionReason::SeekToAnotherItem { old_position_ms },
        EngineTransitionReason::Repeat => TransitionReason::Repeat { old_position_ms },
        EngineTransitionReason::PlaylistChanged => TransitionReason::QueueChanged { old_position_ms },
    }
}

/// Map an engine position discontinuity onto the published reason.
pub fn position_reason(
    reason: DiscontinuityReason,
    old_position_ms: u64,
    new_position_ms: u64,
) -> PositionChangedReason {
    match reason {
        DiscontinuityReason::AutoTransition => PositionChangedReason::AutoTransition {
            old_position_ms,
            new_position_ms,
        },
        DiscontinuityReason::Seek => PositionChangedReason::SeekTo {
            old_position_ms,
            new_position_ms,
        },
        DiscontinuityReason::SeekAdjustment => PositionChangedReason::SeekFailed {
            old_position_ms,
            new_position_ms,
        },
        DiscontinuityReason::Skip => PositionChangedReason::SkippedPeriod {
            old_position_ms,
            new_position_ms,
        },
        DiscontinuityReason::Remove => PositionChangedReason::QueueChanged {
            old_position_ms,
            new_position_ms,
        },
        DiscontinuityReason::Internal => PositionChangedReason::Unknown {
            old_position_ms,
            new_position_ms,
        },
    }
}
