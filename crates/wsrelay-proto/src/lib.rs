//! Relay Protocol Definitions
//!
//! This crate defines the message types that flow through the relay and the
//! newline-delimited JSON codec used on the local input, output and error
//! streams.
//!
//! Remote payloads are opaque: the relay never interprets a [`Message`]
//! beyond its `type` field, and only while authenticating.

pub mod codec;
pub mod messages;

pub use codec::{encode_line, CodecError, LineSink};
pub use messages::{AuthMessage, ErrorEvent, Message, TYPE_AUTH_OK, TYPE_AUTH_REQUIRED};

/// Default maximum size of a single inbound remote message (10MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
