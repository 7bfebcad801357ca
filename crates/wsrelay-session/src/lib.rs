//! Relay session - bridges a local line stream and a remote WebSocket
//!
//! A [`Session`] connects, authenticates, and then runs two forwarders
//! concurrently:
//!
//! - [`inbound::forward_inbound`]: local input lines → remote text frames
//! - [`outbound::forward_outbound`]: remote frames → local output lines
//!
//! Local input is read on a dedicated thread ([`LineReader`]) so a blocking
//! read never stalls remote processing.

pub mod config;
pub mod error;
pub mod inbound;
pub mod outbound;
pub mod reader;
pub mod session;

pub use config::{SessionConfig, TerminationPolicy, DEFAULT_INPUT_BUFFER};
pub use error::SessionError;
pub use inbound::{forward_inbound, InboundExit};
pub use outbound::{forward_outbound, OutboundExit};
pub use reader::{LineReader, LineSource};
pub use session::{Session, SessionEnd};
