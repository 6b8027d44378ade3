//! Addressed, one-way message transport to the session coordinator.
//!
//! The transport primitive is fire-and-forget: a send either hands the
//! message to the peer's queue or reports that the peer is gone. There are
//! no acknowledgements and no delivery guarantees across transport restarts;
//! ordering is preserved per channel. Request/response pairing is layered on
//! top by attaching a reply address to request messages.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use medialink_protocol::MessageKind;

use crate::error::Result;

pub mod fake;

/// One addressed protocol message. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    /// Structured payload; [`JsonValue::Null`] for payload-less kinds.
    pub payload: JsonValue,
    /// Where the paired response should be sent. Present on requests and on
    /// notifications that introduce the sender (Register), absent otherwise.
    pub reply_to: Option<Endpoint>,
}

impl Message {
    /// A one-way message with no reply expected.
    pub fn notification(kind: MessageKind, payload: JsonValue) -> Self {
        Self {
            kind,
            payload,
            reply_to: None,
        }
    }

    /// A request expecting exactly one response of the paired kind at
    /// `reply_to`.
    pub fn request(kind: MessageKind, payload: JsonValue, reply_to: Endpoint) -> Self {
        Self {
            kind,
            payload,
            reply_to: Some(reply_to),
        }
    }
}

/// Clonable one-way send handle to a message endpoint.
///
/// The in-process analogue of a messenger address: anyone holding an
/// `Endpoint` can deliver messages to its owner's inbound queue.
#[derive(Clone)]
pub struct Endpoint {
    tx: mpsc::UnboundedSender<Message>,
}

impl Endpoint {
    /// Creates an endpoint and the receiver draining it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hands `message` to the endpoint's queue. Returns `false` when the
    /// owner is gone; never panics, never blocks.
    pub fn send(&self, message: Message) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Whether the owning receiver still exists.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Ownership of the live connection to the coordinator.
///
/// At most one live `Channel` exists per session; dropping it tears the
/// connection down.
#[derive(Debug)]
pub struct Channel {
    peer: Endpoint,
}

impl Channel {
    pub fn new(peer: Endpoint) -> Self {
        Self { peer }
    }

    /// Fire-and-forget send to the coordinator. Returns `false` when the
    /// coordinator side is gone.
    pub fn send(&self, message: Message) -> bool {
        self.peer.send(message)
    }
}

/// What a successful connect yields.
#[derive(Debug)]
pub struct ChannelParts {
    /// The outbound channel to the coordinator.
    pub channel: Channel,
    /// Inbound queue of messages addressed to this client.
    pub inbound_rx: mpsc::UnboundedReceiver<Message>,
    /// This client's own address, attached to Register as the reply target.
    pub local: Endpoint,
}

/// Transport capable of establishing a channel to a coordinator address.
///
/// Consumed contract: connection setup is the transport's concern (including
/// its reconnect policy); this crate only requires that a successful connect
/// produce [`ChannelParts`].
pub trait Transport: Send + Sync {
    fn connect(
        &self,
        address: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelParts>> + Send + '_>>;
}
