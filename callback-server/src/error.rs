//! Error types for the callback server.

use std::net::SocketAddr;

/// Errors raised while starting or stopping the callback server.
#[derive(Debug, thiserror::Error)]
pub enum CallbackServerError {
    /// The listening socket could not be bound
    #[error("Failed to bind callback server to {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    /// The server task panicked or was aborted
    #[error("Callback server task failed: {0}")]
    Task(String),
}
