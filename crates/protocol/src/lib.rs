//! Wire types for the medialink session protocol.
//!
//! This crate contains the serde-serializable types exchanged between the
//! stream handler and the session coordinator. These types represent the
//! "protocol layer" - the shapes of data as they appear on the channel.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: One payload struct per message kind
//! * Stable: Changes only when the protocol surface changes
//!
//! The session client built on top of these types lives in `medialink-core`.

pub mod kinds;
pub mod types;

pub use kinds::*;
pub use types::*;
