//! Inbound dispatch and outbound sends on the coordinator channel.
//!
//! Every outbound message in the crate passes through [`MessageRouter`],
//! which gates on channel liveness: sends while unbound are silent no-ops,
//! and a dead peer is swallowed with a warning. Neither case propagates as
//! an error, since the channel is expected to be transient and failures here
//! have no useful caller to report to.
//!
//! Request handling is structured as "compute result, then unconditionally
//! send one reply": [`dispatch`](MessageRouter::dispatch) owns the reply for
//! both request kinds, so a handler cannot accidentally drop or duplicate it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use medialink_protocol::{
    EntryPoint, GetMetrics, MessageKind, MetricsReport, MetricsRequest, QueryMetricsCapabilities,
    ReportMetrics, ReportMetricsCapabilities, SchemeSupport, TriggerPlayback,
};

use crate::transport::{Channel, Endpoint, Message};

/// The seam between the router and the session's inbound semantics.
pub trait InboundHandlers {
    /// Side effect only; the protocol defines no response for this kind.
    fn on_trigger_playback(&mut self, entry_points: Vec<EntryPoint>);
    /// One support entry per request, in request order.
    fn on_query_capabilities(&mut self, requests: Vec<MetricsRequest>) -> Vec<SchemeSupport>;
    /// A report for the subscription, empty when the request cannot be served.
    fn on_get_metrics(&mut self, request: Option<MetricsRequest>) -> MetricsReport;
}

/// Constructs, gates, and dispatches messages on the coordinator channel.
#[derive(Default)]
pub struct MessageRouter {
    channel: Option<Channel>,
    local: Option<Endpoint>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a freshly connected channel and the local address.
    pub fn bind(&mut self, channel: Channel, local: Endpoint) {
        self.channel = Some(channel);
        self.local = Some(local);
    }

    /// Releases the channel. Subsequent sends become no-ops.
    pub fn unbind(&mut self) {
        self.channel = None;
        self.local = None;
    }

    pub fn is_bound(&self) -> bool {
        self.channel.is_some()
    }

    /// Sends a one-way notification to the coordinator.
    pub fn send(&self, kind: MessageKind, payload: JsonValue) {
        self.transmit(Message::notification(kind, payload));
    }

    /// Sends a notification carrying this client's address, for kinds whose
    /// handling on the coordinator side may message us back later.
    pub fn send_with_reply_address(&self, kind: MessageKind, payload: JsonValue) {
        match &self.local {
            Some(local) => self.transmit(Message::request(kind, payload, local.clone())),
            None => debug!(target = "medialink", ?kind, "send while unbound, dropping"),
        }
    }

    /// Sends the response paired with an inbound request.
    fn reply(&self, reply_to: Option<&Endpoint>, kind: MessageKind, payload: JsonValue) {
        match reply_to {
            Some(endpoint) => {
                if !endpoint.send(Message::notification(kind, payload)) {
                    warn!(target = "medialink", ?kind, "reply peer is gone, dropping");
                }
            }
            None => warn!(
                target = "medialink",
                ?kind,
                "request arrived without a reply address, dropping response"
            ),
        }
    }

    /// Dispatches one inbound message to its handler.
    ///
    /// Unknown kinds and response kinds we never solicit fall through to a
    /// no-op; a malformed payload degrades to the kind's empty payload.
    /// Nothing on this path is fatal.
    pub fn dispatch(&self, msg: Message, handlers: &mut dyn InboundHandlers) {
        match msg.kind {
            MessageKind::TriggerPlayback => {
                let trigger: TriggerPlayback = decode(msg.kind, msg.payload);
                handlers.on_trigger_playback(trigger.entry_points);
            }
            MessageKind::QueryMetricsCapabilities => {
                let query: QueryMetricsCapabilities = decode(msg.kind, msg.payload);
                let scheme_support = handlers.on_query_capabilities(query.requests);
                self.reply(
                    msg.reply_to.as_ref(),
                    MessageKind::ReportMetricsCapabilities,
                    encode(&ReportMetricsCapabilities { scheme_support }),
                );
            }
            MessageKind::GetMetrics => {
                let get: GetMetrics = decode(msg.kind, msg.payload);
                let report = handlers.on_get_metrics(get.request);
                self.reply(
                    msg.reply_to.as_ref(),
                    MessageKind::ReportMetrics,
                    encode(&ReportMetrics { report }),
                );
            }
            kind => {
                debug!(target = "medialink", ?kind, "no handler for message kind, ignoring");
            }
        }
    }

    fn transmit(&self, message: Message) {
        match &self.channel {
            Some(channel) => {
                debug!(target = "medialink", kind = ?message.kind, "send");
                if !channel.send(message) {
                    warn!(target = "medialink", "coordinator channel is gone, message dropped");
                }
            }
            None => {
                debug!(
                    target = "medialink",
                    kind = ?message.kind,
                    "send while unbound, dropping"
                );
            }
        }
    }
}

/// Serializes an outbound payload. Infallible for protocol types; a failure
/// would be a programming error and degrades to a null payload.
pub(crate) fn encode<T: Serialize>(payload: &T) -> JsonValue {
    serde_json::to_value(payload).unwrap_or(JsonValue::Null)
}

fn decode<T: DeserializeOwned + Default>(kind: MessageKind, payload: JsonValue) -> T {
    serde_json::from_value(payload).unwrap_or_else(|err| {
        warn!(target = "medialink", ?kind, %err, "malformed payload, using empty");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Endpoint;
    use medialink_protocol::schemes;

    #[derive(Default)]
    struct RecordingHandlers {
        triggers: Vec<Vec<EntryPoint>>,
        queries: Vec<Vec<MetricsRequest>>,
        gets: Vec<Option<MetricsRequest>>,
    }

    impl InboundHandlers for RecordingHandlers {
        fn on_trigger_playback(&mut self, entry_points: Vec<EntryPoint>) {
            self.triggers.push(entry_points);
        }

        fn on_query_capabilities(&mut self, requests: Vec<MetricsRequest>) -> Vec<SchemeSupport> {
            let support = requests
                .iter()
                .map(|r| SchemeSupport {
                    scheme: r.scheme.clone(),
                    supported: true,
                })
                .collect();
            self.queries.push(requests);
            support
        }

        fn on_get_metrics(&mut self, request: Option<MetricsRequest>) -> MetricsReport {
            self.gets.push(request);
            MetricsReport::empty()
        }
    }

    #[test]
    fn unbound_send_is_a_silent_no_op() {
        let router = MessageRouter::new();
        router.send(MessageKind::PlaybackStateChanged, JsonValue::Null);
        router.send_with_reply_address(MessageKind::Register, JsonValue::Null);
        // No channel, no panic, nothing to observe: the property is that we
        // got here.
        assert!(!router.is_bound());
    }

    #[tokio::test]
    async fn bound_send_reaches_the_peer() {
        let (peer, mut peer_rx) = Endpoint::new();
        let (local, _local_rx) = Endpoint::new();
        let mut router = MessageRouter::new();
        router.bind(Channel::new(peer), local);

        router.send(
            MessageKind::PlaybackStateChanged,
            serde_json::json!({"state": "PLAYING"}),
        );
        let sent = peer_rx.recv().await.unwrap();
        assert_eq!(sent.kind, MessageKind::PlaybackStateChanged);
        assert!(sent.reply_to.is_none());

        router.send_with_reply_address(MessageKind::Register, JsonValue::Null);
        let registered = peer_rx.recv().await.unwrap();
        assert_eq!(registered.kind, MessageKind::Register);
        assert!(registered.reply_to.is_some());
    }

    #[tokio::test]
    async fn query_request_gets_exactly_one_paired_reply() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();
        let (reply_to, mut reply_rx) = Endpoint::new();

        router.dispatch(
            Message::request(
                MessageKind::QueryMetricsCapabilities,
                serde_json::json!({"requests": [
                    {"scheme": schemes::THREE_GPP_DASH_METRICS, "configurationId": "cfg-1"}
                ]}),
                reply_to,
            ),
            &mut handlers,
        );

        let reply = reply_rx.recv().await.unwrap();
        assert_eq!(reply.kind, MessageKind::ReportMetricsCapabilities);
        assert_eq!(reply.payload["schemeSupport"][0]["supported"], true);
        assert!(reply_rx.try_recv().is_err());
        assert_eq!(handlers.queries.len(), 1);
    }

    #[tokio::test]
    async fn get_metrics_replies_even_for_empty_request() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();
        let (reply_to, mut reply_rx) = Endpoint::new();

        router.dispatch(
            Message::request(MessageKind::GetMetrics, serde_json::json!({}), reply_to),
            &mut handlers,
        );

        let reply = reply_rx.recv().await.unwrap();
        assert_eq!(reply.kind, MessageKind::ReportMetrics);
        assert_eq!(handlers.gets, vec![None]);
    }

    #[test]
    fn unknown_kind_is_forwarded_to_the_default_no_op() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();

        router.dispatch(
            Message::notification(MessageKind::Unknown, serde_json::json!({"blob": 1})),
            &mut handlers,
        );
        router.dispatch(
            Message::notification(MessageKind::ReportMetrics, JsonValue::Null),
            &mut handlers,
        );

        assert!(handlers.triggers.is_empty());
        assert!(handlers.queries.is_empty());
        assert!(handlers.gets.is_empty());
    }

    #[test]
    fn malformed_payload_degrades_to_empty() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();

        router.dispatch(
            Message::notification(
                MessageKind::TriggerPlayback,
                serde_json::json!({"entryPoints": "not-a-list"}),
            ),
            &mut handlers,
        );

        assert_eq!(handlers.triggers, vec![vec![]]);
    }

    #[test]
    fn request_without_reply_address_does_not_panic() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();

        router.dispatch(
            Message::notification(MessageKind::GetMetrics, serde_json::json!({})),
            &mut handlers,
        );
        assert_eq!(handlers.gets.len(), 1);
    }

    #[tokio::test]
    async fn trigger_playback_has_no_reply() {
        let router = MessageRouter::new();
        let mut handlers = RecordingHandlers::default();
        let (reply_to, mut reply_rx) = Endpoint::new();

        router.dispatch(
            Message::request(
                MessageKind::TriggerPlayback,
                serde_json::json!({"entryPoints": []}),
                reply_to,
            ),
            &mut handlers,
        );

        assert_eq!(handlers.triggers.len(), 1);
        assert!(reply_rx.try_recv().is_err());
    }
}
