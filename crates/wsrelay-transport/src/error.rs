use thiserror::Error;
use tokio_tungstenite::tungstenite;
use wsrelay_proto::CodecError;

use crate::connection::ConnectionState;

/// Errors raised while connecting to, authenticating with, or talking to
/// the remote service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid WebSocket URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        url: String,
        source: tungstenite::Error,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Connection closed during handshake")]
    ClosedDuringHandshake,

    #[error("Malformed handshake frame: {0}")]
    MalformedHandshake(#[source] serde_json::Error),

    #[error("Invalid connection state: expected {expected}, found {actual}")]
    InvalidState {
        expected: ConnectionState,
        actual: ConnectionState,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type TransportResult<T> = Result<T, TransportError>;
