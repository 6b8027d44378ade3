//! medialink: a playback-side session client.
//!
//! Coordinates a media playback engine running in this process with a
//! session-coordination authority running in another, over an asynchronous,
//! addressed, fire-and-forget message channel.
//!
//! The three problems this crate owns:
//! * request/response pairing layered on a one-way message primitive
//!   ([`router`]),
//! * reconciling conflicting engine callbacks into one canonical playback
//!   state, reported at most once per change ([`state`]),
//! * the metrics-capability lifecycle: per-session subscriptions with a
//!   guaranteed final flush before teardown ([`metrics`], [`session`]).
//!
//! Media decoding, transport reconnect policy, and manifest resolution are
//! external collaborators consumed through the [`engine`] and [`transport`]
//! traits.

pub mod engine;
pub mod error;
pub mod metrics;
pub mod router;
pub mod session;
pub mod state;
pub mod transport;

pub use engine::{EngineNotification, PlayerEngine, RawPhase};
pub use error::{Error, Result};
pub use metrics::{MetricsCapabilityRegistry, MetricsReportGenerator};
pub use router::{InboundHandlers, MessageRouter};
pub use session::{ConnectionState, SessionConfig, SessionController};
pub use state::{PlaybackStateSynchronizer, canonical_state};
pub use transport::{Channel, ChannelParts, Endpoint, Message, Transport};
