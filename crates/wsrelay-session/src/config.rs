//! Session configuration

use std::fmt;
use wsrelay_transport::{ConnectionConfig, TransportResult};

/// Default capacity of the local input line channel
pub const DEFAULT_INPUT_BUFFER: usize = 64;

/// What ends a session once forwarding has started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationPolicy {
    /// Stop both directions as soon as either one finishes
    #[default]
    EitherDirection,
    /// Keep delivering remote frames after local input ends, until the
    /// remote closes
    RemoteOnly,
}

/// Relay session configuration
#[derive(Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    pub access_token: String,
    pub termination: TerminationPolicy,
    pub input_buffer: usize,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("connection", &self.connection)
            .field("access_token", &"<redacted>")
            .field("termination", &self.termination)
            .field("input_buffer", &self.input_buffer)
            .finish()
    }
}

impl SessionConfig {
    pub fn new(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            connection: ConnectionConfig::new(url),
            access_token: access_token.into(),
            termination: TerminationPolicy::default(),
            input_buffer: DEFAULT_INPUT_BUFFER,
        }
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.connection = self.connection.with_max_message_size(size);
        self
    }

    pub fn with_termination(mut self, policy: TerminationPolicy) -> Self {
        self.termination = policy;
        self
    }

    pub fn with_input_buffer(mut self, capacity: usize) -> Self {
        self.input_buffer = capacity;
        self
    }

    pub fn validate(&self) -> TransportResult<()> {
        self.connection.validate().map(|_| ())
    }
}
