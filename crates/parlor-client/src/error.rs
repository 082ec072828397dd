use thiserror::Error;

use parlor_shared::{ProtocolError, ValidationError};

/// Errors produced by the client layer.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },

    /// Input rejected before reaching the network.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A realtime frame could not be encoded or decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Local file access (upload source).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The realtime channel or the driver loop went away.
    #[error("Realtime channel closed")]
    ChannelClosed,

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
