//! Contract consumed from the external player engine.
//!
//! The engine owns decoding and rendering; this crate only needs its coarse
//! playback phase, two intent flags, telemetry access, and a notification
//! stream. Implementations live outside this crate (a real adapter around a
//! media framework); [`fake::FakeEngine`] ships for tests.

use tokio::sync::mpsc;

use medialink_protocol::ContentType;

pub mod fake;

/// The engine's coarse playback phase.
///
/// Deliberately narrower than [`PlaybackState`](medialink_protocol::PlaybackState):
/// the precise playing/paused distinction comes from combining the phase with
/// the `is_playing` and `play_when_ready` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPhase {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// One raw engine callback. Each variant supplies a subset of the canonical
/// mapping inputs; the synchronizer retains last-known values for the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineNotification {
    PhaseChanged(RawPhase),
    IsPlayingChanged(bool),
    PlayWhenReadyChanged(bool),
    /// Playback fault. Logged as a diagnostic; drives no state transition
    /// and no outbound message.
    PlaybackError(String),
}

/// Playback engine collaborator.
///
/// All methods are non-blocking from the session's point of view: control
/// calls hand work to the engine, queries read its current snapshot.
pub trait PlayerEngine: Send + Sync {
    fn attach(&self, url: &str, content_type: ContentType);
    fn preload(&self);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);

    fn current_phase(&self) -> RawPhase;
    fn is_playing(&self) -> bool;
    fn play_when_ready(&self) -> bool;

    /// Whether the engine can produce reports for a metrics scheme.
    fn is_scheme_supported(&self, scheme: &str) -> bool;
    /// Serialized scheme-specific report from current telemetry.
    fn collect_metrics(&self, scheme: &str) -> String;
    /// Resets cumulative telemetry so the next report covers only the
    /// subsequent interval.
    fn reset_metrics_counters(&self);

    /// Subscription point for raw state-change notifications. The session
    /// registers exactly one subscriber per connect.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<EngineNotification>;
}
