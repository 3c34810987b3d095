//! Server error types.

use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The bind address could not be parsed.
    #[error("Invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// The listener could not be bound.
    #[error("Failed to bind to {addr}")]
    Bind {
        /// The address that was tried.
        addr: std::net::SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
