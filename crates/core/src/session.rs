//! Session lifecycle: connect, register, operate, flush-and-disconnect.
//!
//! [`SessionController`] owns the channel to the coordinator and everything
//! session-scoped. Two independent event sources feed it concurrently -
//! inbound transport messages and engine notifications - so all mutable
//! session state sits behind one lock, the session's single ordering point.
//! No handler blocks on I/O: sends are fire-and-forget, and both metrics
//! handlers compute their result synchronously from local and engine state.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, warn};

use medialink_protocol::{
    ContentType, EntryPoint, MessageKind, MetricsReport, MetricsRequest, PlaybackState,
    ReportMetrics, SchemeSupport, ServiceListEntry, SetEndpoint, StartPlayback,
};

use crate::engine::{EngineNotification, PlayerEngine};
use crate::error::{Error, Result};
use crate::metrics::{MetricsCapabilityRegistry, MetricsReportGenerator};
use crate::router::{InboundHandlers, MessageRouter, encode};
use crate::state::PlaybackStateSynchronizer;
use crate::transport::{Message, Transport};

/// Connection lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Registered,
    TearingDown,
}

/// Static configuration of the session client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Transport address of the session coordinator.
    pub coordinator_address: String,
    /// The one content type this client's engine can play. Entry points of
    /// any other type are ignored during playback triggering.
    #[serde(default)]
    pub supported_content_type: ContentType,
    /// Media endpoint announced to the coordinator right after registration,
    /// when set.
    #[serde(default)]
    pub media_endpoint: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            coordinator_address: "medialink:session-coordinator".to_string(),
            supported_content_type: ContentType::Dash,
            media_endpoint: None,
        }
    }
}

/// Orchestrates the session against the coordinator, owning the router,
/// state synchronizer, and metrics registry as collaborators.
pub struct SessionController {
    inner: Arc<Mutex<Inner>>,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    engine: Arc<dyn PlayerEngine>,
}

struct Inner {
    state: ConnectionState,
    router: MessageRouter,
    synchronizer: PlaybackStateSynchronizer,
    registry: MetricsCapabilityRegistry,
    generator: MetricsReportGenerator,
    engine: Arc<dyn PlayerEngine>,
    supported_content_type: ContentType,
    /// Stops the event loop of the current connection, if one is running.
    shutdown: Option<Arc<Notify>>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        engine: Arc<dyn PlayerEngine>,
    ) -> Self {
        let inner = Inner {
            state: ConnectionState::Disconnected,
            router: MessageRouter::new(),
            synchronizer: PlaybackStateSynchronizer::new(),
            registry: MetricsCapabilityRegistry::new(),
            generator: MetricsReportGenerator::new(Arc::clone(&engine)),
            engine: Arc::clone(&engine),
            supported_content_type: config.supported_content_type,
            shutdown: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            config,
            transport,
            engine,
        }
    }

    /// Connects to the coordinator and registers this client.
    ///
    /// On success the session is `Registered`, the Register notification has
    /// been sent with this client's reply address, and the event loop is
    /// running. On failure the session is back to `Disconnected` and the
    /// error is returned to the caller; there is no automatic retry.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.state != ConnectionState::Disconnected {
                return Err(Error::AlreadyConnected);
            }
            inner.state = ConnectionState::Connecting;
        }

        let parts = match self.transport.connect(&self.config.coordinator_address).await {
            Ok(parts) => parts,
            Err(err) => {
                self.inner.lock().state = ConnectionState::Disconnected;
                error!(target = "medialink", error = %err, "connect failed");
                return Err(err);
            }
        };

        let engine_rx = self.engine.subscribe();
        let shutdown = Arc::new(Notify::new());
        {
            let mut inner = self.inner.lock();
            inner.router.bind(parts.channel, parts.local);
            inner.state = ConnectionState::Registered;
            inner.shutdown = Some(Arc::clone(&shutdown));
            inner
                .router
                .send_with_reply_address(MessageKind::Register, JsonValue::Null);
            if let Some(url) = &self.config.media_endpoint {
                inner.router.send_with_reply_address(
                    MessageKind::SetEndpoint,
                    encode(&SetEndpoint { url: url.clone() }),
                );
            }
        }
        debug!(target = "medialink", address = %self.config.coordinator_address, "registered");

        tokio::spawn(run_event_loop(
            Arc::clone(&self.inner),
            parts.inbound_rx,
            engine_rx,
            shutdown,
        ));
        Ok(())
    }

    /// Ends the session: sends one final metrics report for every active
    /// subscription, then releases the channel.
    ///
    /// The flush is best-effort per entry - a send failure for one entry
    /// never aborts the remaining ones - but every entry is attempted before
    /// the channel goes away. No-op unless currently registered.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        if inner.state != ConnectionState::Registered {
            return;
        }
        inner.state = ConnectionState::TearingDown;

        let subscriptions: Vec<MetricsRequest> = inner.registry.supported_requests().to_vec();
        debug!(
            target = "medialink",
            subscriptions = subscriptions.len(),
            "final metrics flush"
        );
        for request in &subscriptions {
            let report = inner.generator.generate(Some(request));
            inner
                .router
                .send(MessageKind::ReportMetrics, encode(&ReportMetrics { report }));
        }

        inner.router.unbind();
        inner.state = ConnectionState::Disconnected;
        if let Some(shutdown) = inner.shutdown.take() {
            shutdown.notify_one();
        }
    }

    /// Starts a new streaming session on the existing connection: clears the
    /// metrics subscriptions so nothing carries over. Connection state is
    /// unchanged.
    pub fn start_new_streaming_session(&self) {
        self.inner.lock().registry.reset_for_new_session();
    }

    /// Announces the media endpoint the coordinator should provision against.
    pub fn set_endpoint(&self, url: &str) {
        self.inner.lock().router.send_with_reply_address(
            MessageKind::SetEndpoint,
            encode(&SetEndpoint {
                url: url.to_string(),
            }),
        );
    }

    /// Asks the coordinator to start playback from a provisioned service
    /// list entry. Silent no-op while unbound, like every send.
    pub fn start_playback(&self, entry: ServiceListEntry) {
        self.inner.lock().router.send_with_reply_address(
            MessageKind::StartPlayback,
            encode(&StartPlayback { entry }),
        );
    }

    /// Diagnostic snapshot of the connection lifecycle.
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Diagnostic snapshot of the canonical playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.inner.lock().synchronizer.current_state()
    }
}

/// Drives one connection: serializes inbound messages and engine
/// notifications through the session lock until shutdown or transport death.
async fn run_event_loop(
    inner: Arc<Mutex<Inner>>,
    mut inbound_rx: mpsc::UnboundedReceiver<Message>,
    mut engine_rx: mpsc::UnboundedReceiver<EngineNotification>,
    shutdown: Arc<Notify>,
) {
    let mut engine_open = true;
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            msg = inbound_rx.recv() => match msg {
                Some(msg) => inner.lock().handle_inbound(msg),
                None => {
                    // The coordinator is gone. The channel is already dead,
                    // so no flush: force-disconnect directly.
                    let mut inner = inner.lock();
                    if inner.state == ConnectionState::Registered {
                        warn!(target = "medialink", "transport closed unexpectedly");
                        inner.router.unbind();
                        inner.state = ConnectionState::Disconnected;
                        inner.shutdown = None;
                    }
                    break;
                }
            },
            note = engine_rx.recv(), if engine_open => match note {
                Some(note) => inner.lock().handle_engine_notification(&note),
                None => engine_open = false,
            },
        }
    }
    debug!(target = "medialink", "session event loop ended");
}

impl Inner {
    fn handle_inbound(&mut self, msg: Message) {
        if self.state != ConnectionState::Registered {
            debug!(target = "medialink", kind = ?msg.kind, "inbound while not registered, ignoring");
            return;
        }
        let engine = Arc::clone(&self.engine);
        let mut handlers = SessionHandlers {
            engine: engine.as_ref(),
            registry: &mut self.registry,
            generator: &self.generator,
            supported_content_type: self.supported_content_type,
        };
        self.router.dispatch(msg, &mut handlers);
    }

    fn handle_engine_notification(&mut self, note: &EngineNotification) {
        self.synchronizer.on_notification(note, &self.router);
    }
}

/// Inbound request semantics, borrowed out of [`Inner`] per dispatch.
struct SessionHandlers<'a> {
    engine: &'a dyn PlayerEngine,
    registry: &'a mut MetricsCapabilityRegistry,
    generator: &'a MetricsReportGenerator,
    supported_content_type: ContentType,
}

impl InboundHandlers for SessionHandlers<'_> {
    fn on_trigger_playback(&mut self, entry_points: Vec<EntryPoint>) {
        // First entry of the supported content type wins; everything else
        // is ignored, and no match means nothing to do, not a failure.
        let Some(entry) = entry_points
            .into_iter()
            .find(|entry| entry.content_type == self.supported_content_type)
        else {
            debug!(target = "medialink", "no compatible entry point, nothing to do");
            return;
        };

        debug!(target = "medialink", locator = %entry.locator, "triggering playback");
        self.engine.attach(&entry.locator, entry.content_type);
        self.engine.preload();
        self.engine.play();
    }

    fn on_query_capabilities(&mut self, requests: Vec<MetricsRequest>) -> Vec<SchemeSupport> {
        self.registry.query_capabilities(self.engine, requests)
    }

    fn on_get_metrics(&mut self, request: Option<MetricsRequest>) -> MetricsReport {
        self.generator.generate(request.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use crate::transport::fake::FakeTransportBuilder;

    fn controller_with_fakes() -> (SessionController, FakeEngine) {
        let (transport, _coordinator) = FakeTransportBuilder::new().build();
        let engine = FakeEngine::new();
        let controller = SessionController::new(
            SessionConfig::default(),
            Arc::new(transport),
            Arc::new(engine.clone()),
        );
        (controller, engine)
    }

    #[test]
    fn starts_disconnected() {
        let (controller, _engine) = controller_with_fakes();
        assert_eq!(controller.connection_state(), ConnectionState::Disconnected);
        assert_eq!(controller.playback_state(), PlaybackState::Unknown);
    }

    #[test]
    fn disconnect_before_connect_is_a_no_op() {
        let (controller, _engine) = controller_with_fakes();
        controller.disconnect();
        assert_eq!(controller.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn sends_before_connect_are_silent() {
        let (controller, _engine) = controller_with_fakes();
        controller.set_endpoint("https://af.example.com/3gpp-m5/v2");
        controller.start_playback(ServiceListEntry {
            provisioning_session_id: "prov-1".into(),
            name: "demo".into(),
            entry_points: vec![],
        });
        // Nothing panics and the state is untouched.
        assert_eq!(controller.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn denied_connect_surfaces_the_error_and_stays_disconnected() {
        let (transport, _coordinator) = FakeTransportBuilder::new().deny_connect().build();
        let engine = FakeEngine::new();
        let controller = SessionController::new(
            SessionConfig::default(),
            Arc::new(transport),
            Arc::new(engine),
        );

        let err = controller.connect().await.unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
        assert_eq!(controller.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn second_connect_is_rejected() {
        let (controller, _engine) = controller_with_fakes();
        controller.connect().await.unwrap();
        assert!(matches!(
            controller.connect().await,
            Err(Error::AlreadyConnected)
        ));
    }

    #[test]
    fn default_config_prefers_dash() {
        let config = SessionConfig::default();
        assert_eq!(config.supported_content_type, ContentType::Dash);
        assert!(config.media_endpoint.is_none());
    }
}
