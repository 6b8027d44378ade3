//! Error type for the session client.
//!
//! Very little in this crate is fallible by design: send failures on a dead
//! channel, unknown message kinds, and malformed payloads all degrade to
//! logged no-ops because the protocol defines no caller to report them to.
//! The errors below cover the paths that do have a caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The transport refused the connection (bind or permission failure).
    /// Never retried automatically; the caller's supervisor decides.
    #[error("failed to connect to session coordinator: {0}")]
    Connect(String),

    /// A connect was attempted while a session channel already exists or is
    /// being established.
    #[error("a coordinator connection is already active")]
    AlreadyConnected,
}
