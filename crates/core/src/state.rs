//! Canonical playback state: mapping and synchronization.
//!
//! Engines expose a coarse phase plus two independent flags (`is_playing`,
//! `play_when_ready`) whose combination is not a clean bijection onto the
//! playing/paused distinction the coordinator needs. [`canonical_state`]
//! refines the phase with the flags; [`PlaybackStateSynchronizer`] feeds it
//! the latest known inputs and reports each canonical transition exactly
//! once.

use tracing::debug;

use medialink_protocol::{MessageKind, PlaybackState, PlaybackStateChanged};

use crate::engine::{EngineNotification, RawPhase};
use crate::router::{MessageRouter, encode};

/// Maps a raw engine snapshot to the canonical playback state.
///
/// Tie-break rules, in priority order:
/// 1. `is_playing` wins over everything: the engine is rendering.
/// 2. A ready engine that was told not to play is paused.
/// 3. Otherwise the phase maps structurally; `Ready` outside rule 2 is a
///    transient the structural map has no name for, so it stays `Unknown`
///    until the engine reports `is_playing`.
pub fn canonical_state(phase: RawPhase, is_playing: bool, play_when_ready: bool) -> PlaybackState {
    if is_playing {
        return PlaybackState::Playing;
    }
    if phase == RawPhase::Ready && !play_when_ready {
        return PlaybackState::ReadyPaused;
    }
    match phase {
        RawPhase::Idle => PlaybackState::Idle,
        RawPhase::Buffering => PlaybackState::Buffering,
        RawPhase::Ended => PlaybackState::Ended,
        RawPhase::Ready => PlaybackState::Unknown,
    }
}

/// Reconciles raw engine notifications into one canonical state and pushes
/// each change to the coordinator exactly once.
///
/// Owned by the session and only ever touched under its lock, which is what
/// makes the dedup sound when inbound messages and engine callbacks arrive
/// from different execution contexts.
pub struct PlaybackStateSynchronizer {
    current: PlaybackState,
    phase: RawPhase,
    is_playing: bool,
    play_when_ready: bool,
}

impl PlaybackStateSynchronizer {
    pub fn new() -> Self {
        Self {
            current: PlaybackState::Unknown,
            phase: RawPhase::Idle,
            is_playing: false,
            play_when_ready: false,
        }
    }

    /// Folds one engine notification into the last-known inputs, recomputes
    /// the canonical state, and emits a `PlaybackStateChanged` through the
    /// router when and only when the canonical state actually changed.
    pub fn on_notification(&mut self, note: &EngineNotification, router: &MessageRouter) {
        match note {
            EngineNotification::PhaseChanged(phase) => self.phase = *phase,
            EngineNotification::IsPlayingChanged(playing) => self.is_playing = *playing,
            EngineNotification::PlayWhenReadyChanged(pwr) => self.play_when_ready = *pwr,
            EngineNotification::PlaybackError(reason) => {
                // Diagnostics only. No canonical transition, no message.
                debug!(target = "medialink", %reason, "engine reported a playback error");
                return;
            }
        }

        let candidate = canonical_state(self.phase, self.is_playing, self.play_when_ready);
        if candidate == self.current {
            return;
        }

        debug!(
            target = "medialink",
            from = ?self.current,
            to = ?candidate,
            "canonical playback state changed"
        );
        self.current = candidate;
        router.send(
            MessageKind::PlaybackStateChanged,
            encode(&PlaybackStateChanged { state: candidate }),
        );
    }

    /// Read-only snapshot, for diagnostics and tests.
    pub fn current_state(&self) -> PlaybackState {
        self.current
    }
}

impl Default for PlaybackStateSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}
