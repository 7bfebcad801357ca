use thiserror::Error;
use wsrelay_proto::CodecError;
use wsrelay_transport::TransportError;

/// Errors that end a relay session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connecting, authenticating, or reading from the remote failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A local sink could not be written
    #[error(transparent)]
    Sink(#[from] CodecError),
}

impl SessionError {
    /// Whether the failure came from the remote side
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}
