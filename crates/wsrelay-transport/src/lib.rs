//! WebSocket connection management using tokio-tungstenite
//!
//! A [`Connection`] is a single client connection to the remote service. It
//! is established with [`Connection::connect`], authenticated once with
//! [`Connection::handshake`], and then split into a [`ConnectionSender`] and
//! a [`ConnectionReceiver`] so each forwarding direction owns its half
//! exclusively.
//!
//! # Handshake
//!
//! The first data frame from the server is the greeting. If its `type` is
//! `auth_required`, exactly one `{"type":"auth","access_token":...}` message
//! is sent and the server's reply is read. Both frames are emitted verbatim
//! to the caller's output sink.

pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;

pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionReceiver, ConnectionSender, ConnectionState, Frame};
pub use error::{TransportError, TransportResult};
pub use handshake::HandshakeOutcome;
