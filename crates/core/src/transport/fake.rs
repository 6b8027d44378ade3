//! Fake transport for unit testing the session protocol without a real
//! coordinator process.
//!
//! Provides an in-memory transport plus a controller impersonating the
//! coordinator: it captures every message the client sends and can inject
//! inbound requests, with or without a capturing reply endpoint.
//!
//! # Example
//!
//! ```ignore
//! let (transport, coordinator) = FakeTransportBuilder::new().build();
//! let controller = SessionController::new(config, Arc::new(transport), engine);
//! controller.connect().await?;
//!
//! let registered = coordinator.recv_sent().await.unwrap();
//! assert_eq!(registered.kind, MessageKind::Register);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, watch};

use medialink_protocol::MessageKind;

use super::{Channel, ChannelParts, Endpoint, Message, Transport};
use crate::error::{Error, Result};

/// Builder for creating fake transport instances.
pub struct FakeTransportBuilder {
    deny: bool,
}

impl FakeTransportBuilder {
    pub fn new() -> Self {
        Self { deny: false }
    }

    /// Makes every connect fail, simulating a permission denial.
    pub fn deny_connect(mut self) -> Self {
        self.deny = true;
        self
    }

    /// Build the fake transport and the coordinator-side controller.
    pub fn build(self) -> (FakeTransport, FakeCoordinator) {
        let shared = Arc::new(Mutex::new(SharedState {
            client_inbound: None,
        }));
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (died, _) = watch::channel(false);
        let died = Arc::new(died);

        let transport = FakeTransport {
            deny: self.deny,
            sent_tx,
            shared: Arc::clone(&shared),
            died: Arc::clone(&died),
        };
        let coordinator = FakeCoordinator {
            sent_rx: Mutex::new(sent_rx),
            shared,
            died,
        };
        (transport, coordinator)
    }
}

impl Default for FakeTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct SharedState {
    /// Send half of the client's inbound queue, populated on connect.
    client_inbound: Option<Endpoint>,
}

/// In-memory [`Transport`] whose peer is a [`FakeCoordinator`].
///
/// The client's local address is a distinct channel pumped into the inbound
/// queue by a spawned forwarder. Copies of the address held by the client or
/// the coordinator therefore never keep the inbound stream open once the
/// transport dies, matching real IPC where a stale address is just a dead
/// letter box.
pub struct FakeTransport {
    deny: bool,
    sent_tx: mpsc::UnboundedSender<Message>,
    shared: Arc<Mutex<SharedState>>,
    died: Arc<watch::Sender<bool>>,
}

impl Transport for FakeTransport {
    fn connect(
        &self,
        address: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelParts>> + Send + '_>> {
        let address = address.to_string();
        Box::pin(async move {
            if self.deny {
                return Err(Error::Connect(format!(
                    "permission denied binding to {address}"
                )));
            }

            // Peer side: everything the client sends lands in the
            // coordinator's `sent` queue.
            let peer = Endpoint {
                tx: self.sent_tx.clone(),
            };

            let (local, mut local_rx) = Endpoint::new();
            let (inbound, inbound_rx) = Endpoint::new();
            self.shared.lock().client_inbound = Some(inbound.clone());

            let mut died = self.died.subscribe();
            tokio::spawn(async move {
                if *died.borrow() {
                    return;
                }
                loop {
                    tokio::select! {
                        _ = died.changed() => break,
                        message = local_rx.recv() => match message {
                            Some(message) => {
                                if !inbound.send(message) {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });

            Ok(ChannelParts {
                channel: Channel::new(peer),
                inbound_rx,
                local,
            })
        })
    }
}

/// Controller impersonating the coordinator: inspects sent messages and
/// injects inbound ones.
pub struct FakeCoordinator {
    sent_rx: Mutex<mpsc::UnboundedReceiver<Message>>,
    shared: Arc<Mutex<SharedState>>,
    died: Arc<watch::Sender<bool>>,
}

impl FakeCoordinator {
    /// Awaits the next message the client sent over the channel.
    pub async fn recv_sent(&self) -> Option<Message> {
        self.sent_rx.lock().recv().await
    }

    /// Drains every message the client has sent so far.
    pub fn take_sent(&self) -> Vec<Message> {
        let mut rx = self.sent_rx.lock();
        let mut sent = Vec::new();
        while let Ok(message) = rx.try_recv() {
            sent.push(message);
        }
        sent
    }

    /// Injects a one-way message into the client's inbound queue.
    pub fn inject(&self, kind: MessageKind, payload: JsonValue) {
        self.deliver(Message::notification(kind, payload));
    }

    /// Injects a request carrying a fresh reply endpoint and returns the
    /// receiver capturing the client's response.
    pub fn request_with_reply(
        &self,
        kind: MessageKind,
        payload: JsonValue,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (reply_to, reply_rx) = Endpoint::new();
        self.deliver(Message::request(kind, payload, reply_to));
        reply_rx
    }

    /// Kills the transport: the client's inbound stream ends as if the
    /// coordinator process crashed.
    pub fn disconnect(&self) {
        self.shared.lock().client_inbound = None;
        self.died.send_replace(true);
    }

    /// Closes the coordinator's receive queue so every further client send
    /// fails at the channel.
    pub fn close_channel(&self) {
        self.sent_rx.lock().close();
    }

    fn deliver(&self, message: Message) {
        let inbound = self.shared.lock().client_inbound.clone();
        if let Some(inbound) = inbound {
            inbound.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_produces_linked_channel_and_inbound() {
        let (transport, coordinator) = FakeTransportBuilder::new().build();
        let mut parts = transport.connect("coordinator:session").await.unwrap();

        parts
            .channel
            .send(Message::notification(MessageKind::Register, JsonValue::Null));
        let sent = coordinator.recv_sent().await.unwrap();
        assert_eq!(sent.kind, MessageKind::Register);

        coordinator.inject(MessageKind::TriggerPlayback, serde_json::json!({}));
        let inbound = parts.inbound_rx.recv().await.unwrap();
        assert_eq!(inbound.kind, MessageKind::TriggerPlayback);
    }

    #[tokio::test]
    async fn local_address_is_pumped_into_inbound() {
        let (transport, _coordinator) = FakeTransportBuilder::new().build();
        let mut parts = transport.connect("coordinator:session").await.unwrap();

        parts.local.send(Message::notification(
            MessageKind::ReportMetrics,
            serde_json::json!({}),
        ));
        let inbound = parts.inbound_rx.recv().await.unwrap();
        assert_eq!(inbound.kind, MessageKind::ReportMetrics);
    }

    #[tokio::test]
    async fn denied_connect_reports_error() {
        let (transport, _coordinator) = FakeTransportBuilder::new().deny_connect().build();
        let err = transport.connect("coordinator:session").await.unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
    }

    #[tokio::test]
    async fn disconnect_closes_the_client_inbound() {
        let (transport, coordinator) = FakeTransportBuilder::new().build();
        let mut parts = transport.connect("coordinator:session").await.unwrap();

        coordinator.disconnect();
        assert!(parts.inbound_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_channel_fails_sends() {
        let (transport, coordinator) = FakeTransportBuilder::new().build();
        let parts = transport.connect("coordinator:session").await.unwrap();

        coordinator.close_channel();
        assert!(!parts.channel.send(Message::notification(
            MessageKind::Register,
            JsonValue::Null
        )));
    }
}
