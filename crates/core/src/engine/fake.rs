//! Scriptable player engine for tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use medialink_protocol::ContentType;

use super::{EngineNotification, PlayerEngine, RawPhase};

/// Control calls the fake records, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Attach { url: String, content_type: ContentType },
    Preload,
    Play,
    Pause,
    Stop,
}

#[derive(Default)]
struct FakeEngineState {
    calls: Vec<EngineCall>,
    phase: Option<RawPhase>,
    is_playing: bool,
    play_when_ready: bool,
    metrics: HashMap<String, String>,
    counter_resets: u32,
    subscribers: Vec<mpsc::UnboundedSender<EngineNotification>>,
}

/// In-memory [`PlayerEngine`] recording control calls and serving scripted
/// telemetry. Clone to keep a scripting handle while the session owns the
/// engine.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeEngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a scheme supported and scripts the payload `collect_metrics`
    /// returns for it.
    pub fn support_scheme(&self, scheme: &str, payload: &str) {
        self.state
            .lock()
            .metrics
            .insert(scheme.to_string(), payload.to_string());
    }

    /// Pushes a raw notification to every subscriber, updating the snapshot
    /// the way a real engine would before calling its listeners.
    pub fn notify(&self, note: EngineNotification) {
        let mut state = self.state.lock();
        match &note {
            EngineNotification::PhaseChanged(phase) => state.phase = Some(*phase),
            EngineNotification::IsPlayingChanged(playing) => state.is_playing = *playing,
            EngineNotification::PlayWhenReadyChanged(pwr) => state.play_when_ready = *pwr,
            EngineNotification::PlaybackError(_) => {}
        }
        state.subscribers.retain(|tx| tx.send(note.clone()).is_ok());
    }

    /// Control calls recorded so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// How many times cumulative counters were reset.
    pub fn counter_resets(&self) -> u32 {
        self.state.lock().counter_resets
    }
}

impl PlayerEngine for FakeEngine {
    fn attach(&self, url: &str, content_type: ContentType) {
        self.state.lock().calls.push(EngineCall::Attach {
            url: url.to_string(),
            content_type,
        });
    }

    fn preload(&self) {
        self.state.lock().calls.push(EngineCall::Preload);
    }

    fn play(&self) {
        self.state.lock().calls.push(EngineCall::Play);
    }

    fn pause(&self) {
        self.state.lock().calls.push(EngineCall::Pause);
    }

    fn stop(&self) {
        self.state.lock().calls.push(EngineCall::Stop);
    }

    fn current_phase(&self) -> RawPhase {
        self.state.lock().phase.unwrap_or(RawPhase::Idle)
    }

    fn is_playing(&self) -> bool {
        self.state.lock().is_playing
    }

    fn play_when_ready(&self) -> bool {
        self.state.lock().play_when_ready
    }

    fn is_scheme_supported(&self, scheme: &str) -> bool {
        self.state.lock().metrics.contains_key(scheme)
    }

    fn collect_metrics(&self, scheme: &str) -> String {
        self.state
            .lock()
            .metrics
            .get(scheme)
            .cloned()
            .unwrap_or_default()
    }

    fn reset_metrics_counters(&self) {
        self.state.lock().counter_resets += 1;
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<EngineNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(tx);
        rx
    }
}
