//! Authentication handshake

use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};
use wsrelay_proto::{AuthMessage, LineSink, Message, TYPE_AUTH_OK, TYPE_AUTH_REQUIRED};

use crate::connection::{Connection, ConnectionState};
use crate::error::{TransportError, TransportResult};

/// Frames exchanged during the handshake
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeOutcome {
    /// First frame sent by the server
    pub greeting: Message,
    /// Server reply to our auth message, if auth was requested
    pub auth_result: Option<Message>,
}

impl HandshakeOutcome {
    pub fn auth_requested(&self) -> bool {
        self.auth_result.is_some()
    }
}

impl Connection {
    /// Run the one-time authentication handshake
    ///
    /// The greeting, and the auth reply when auth was requested, are written
    /// verbatim to `output` as they arrive. The access token is sent only if
    /// the greeting asks for it, and at most once per connection.
    pub async fn handshake<W>(
        &mut self,
        access_token: &str,
        output: &mut LineSink<W>,
    ) -> TransportResult<HandshakeOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        self.expect_state(ConnectionState::Handshaking)?;

        let greeting = self.recv_handshake_message().await?;
        output.emit(&greeting).await?;

        let auth_result = if greeting.is_type(TYPE_AUTH_REQUIRED) {
            let auth = serde_json::to_string(&AuthMessage::new(access_token))
                .map_err(wsrelay_proto::CodecError::from)?;
            self.send_text(auth).await?;
            debug!(connection_id = %self.connection_id(), "Sent auth message");

            let reply = self.recv_handshake_message().await?;
            output.emit(&reply).await?;

            if reply.is_type(TYPE_AUTH_OK) {
                info!(connection_id = %self.connection_id(), "Authenticated with remote service");
            } else {
                warn!(
                    connection_id = %self.connection_id(),
                    reply_type = reply.message_type().unwrap_or("<none>"),
                    "Auth message was not acknowledged"
                );
            }
            Some(reply)
        } else {
            debug!(
                connection_id = %self.connection_id(),
                greeting_type = greeting.message_type().unwrap_or("<none>"),
                "Server did not request authentication"
            );
            None
        };

        self.transition(ConnectionState::Authenticated);

        Ok(HandshakeOutcome {
            greeting,
            auth_result,
        })
    }

    async fn recv_handshake_message(&mut self) -> TransportResult<Message> {
        let frame = match self.recv_frame().await? {
            Some(frame) => frame,
            None => {
                self.transition(ConnectionState::Closed);
                return Err(TransportError::ClosedDuringHandshake);
            }
        };

        frame.parse().map_err(TransportError::MalformedHandshake)
    }
}
