//! WebSocket client connection and its split send/receive halves

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::CapacityError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace};
use wsrelay_proto::Message;

use crate::config::{ensure_crypto_provider, ConnectionConfig};
use crate::error::{TransportError, TransportResult};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of a relay connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Handshaking,
    Authenticated,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Handshaking => write!(f, "handshaking"),
            ConnectionState::Authenticated => write!(f, "authenticated"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// One data frame received from the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    /// Decode the frame payload as a JSON message
    pub fn parse(&self) -> Result<Message, serde_json::Error> {
        match self {
            Frame::Text(text) => Message::parse(text),
            Frame::Binary(data) => Message::from_slice(data),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single client connection to the remote service
pub struct Connection {
    connection_id: String,
    stream: WsStream,
    state: ConnectionState,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.connection_id)
            .field("state", &self.state)
            .finish()
    }
}

impl Connection {
    /// Establish the WebSocket connection
    ///
    /// Inbound frames and messages larger than the configured limits are
    /// rejected by the protocol layer and surface as
    /// [`TransportError::FrameTooLarge`].
    pub async fn connect(config: &ConnectionConfig) -> TransportResult<Self> {
        let url = config.validate()?;
        let connection_id = format!("ws-{}", uuid::Uuid::new_v4());

        if url.scheme() == "wss" {
            ensure_crypto_provider();
        }

        debug!(
            connection_id = %connection_id,
            state = %ConnectionState::Connecting,
            host = url.host_str().unwrap_or_default(),
            "Connecting to WebSocket server"
        );

        let (stream, response) = tokio_tungstenite::connect_async_with_config(
            url.as_str(),
            Some(config.websocket_config()),
            config.disable_nagle,
        )
        .await
        .map_err(|source| {
            error!(connection_id = %connection_id, "WebSocket connect failed: {}", source);
            TransportError::ConnectionFailed {
                url: url.to_string(),
                source,
            }
        })?;

        info!(
            connection_id = %connection_id,
            status = %response.status(),
            max_message_size = config.max_message_size,
            "WebSocket connection established"
        );

        Ok(Self {
            connection_id,
            stream,
            state: ConnectionState::Handshaking,
        })
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn transition(&mut self, next: ConnectionState) {
        debug!(
            connection_id = %self.connection_id,
            from = %self.state,
            to = %next,
            "Connection state change"
        );
        self.state = next;
    }

    pub(crate) fn expect_state(&self, expected: ConnectionState) -> TransportResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TransportError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    pub(crate) async fn send_text(&mut self, text: String) -> TransportResult<()> {
        send_text(&mut self.stream, &self.connection_id, text).await
    }

    pub(crate) async fn recv_frame(&mut self) -> TransportResult<Option<Frame>> {
        next_frame(&mut self.stream, &self.connection_id).await
    }

    /// Split an authenticated connection into its two directions
    pub fn split(self) -> TransportResult<(ConnectionSender, ConnectionReceiver)> {
        self.expect_state(ConnectionState::Authenticated)?;

        let (sink, source) = self.stream.split();
        let sender = ConnectionSender {
            connection_id: self.connection_id.clone(),
            sink,
            messages_sent: 0,
            closed: false,
        };
        let receiver = ConnectionReceiver {
            connection_id: self.connection_id,
            source,
            frames_received: 0,
        };

        Ok((sender, receiver))
    }
}

/// Send half of an authenticated connection
pub struct ConnectionSender {
    connection_id: String,
    sink: SplitSink<WsStream, WsMessage>,
    messages_sent: u64,
    closed: bool,
}

impl fmt::Debug for ConnectionSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSender")
            .field("connection_id", &self.connection_id)
            .field("messages_sent", &self.messages_sent)
            .finish()
    }
}

impl ConnectionSender {
    /// Send one message as a compact JSON text frame
    pub async fn send_message(&mut self, message: &Message) -> TransportResult<()> {
        send_text(&mut self.sink, &self.connection_id, message.to_json()).await?;
        self.messages_sent += 1;
        Ok(())
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    /// Send a close frame and flush
    ///
    /// Closing an already closed connection is not an error.
    pub async fn close(&mut self) -> TransportResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                debug!(
                    connection_id = %self.connection_id,
                    state = %ConnectionState::Closed,
                    messages_sent = self.messages_sent,
                    "WebSocket connection closed"
                );
                Ok(())
            }
            Err(e) => Err(TransportError::WebSocket(e)),
        }
    }
}

/// Receive half of an authenticated connection
pub struct ConnectionReceiver {
    connection_id: String,
    source: SplitStream<WsStream>,
    frames_received: u64,
}

impl fmt::Debug for ConnectionReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionReceiver")
            .field("connection_id", &self.connection_id)
            .field("frames_received", &self.frames_received)
            .finish()
    }
}

impl ConnectionReceiver {
    /// Wait for the next data frame
    ///
    /// Returns `Ok(None)` once the remote has closed the connection.
    pub async fn recv_frame(&mut self) -> TransportResult<Option<Frame>> {
        let frame = next_frame(&mut self.source, &self.connection_id).await?;
        if frame.is_some() {
            self.frames_received += 1;
        }
        Ok(frame)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }
}

async fn send_text<S>(sink: &mut S, conn_id: &str, text: String) -> TransportResult<()>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let len = text.len();
    sink.send(WsMessage::Text(text)).await?;
    trace!(connection_id = %conn_id, bytes = len, "Sent text frame");
    Ok(())
}

/// Read until the next data frame, skipping control frames
async fn next_frame<S>(source: &mut S, conn_id: &str) -> TransportResult<Option<Frame>>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    while let Some(result) = source.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                trace!(connection_id = %conn_id, bytes = text.len(), "Received text frame");
                return Ok(Some(Frame::Text(text)));
            }
            Ok(WsMessage::Binary(data)) => {
                trace!(connection_id = %conn_id, bytes = data.len(), "Received binary frame");
                return Ok(Some(Frame::Binary(data)));
            }
            Ok(WsMessage::Ping(_)) => {
                // Pong is automatically handled by tungstenite
                trace!(connection_id = %conn_id, "Received ping");
            }
            Ok(WsMessage::Pong(_)) => {
                trace!(connection_id = %conn_id, "Received pong");
            }
            Ok(WsMessage::Close(frame)) => {
                debug!(connection_id = %conn_id, close_frame = ?frame, "WebSocket close received");
                return Ok(None);
            }
            Ok(WsMessage::Frame(_)) => {}
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                debug!(connection_id = %conn_id, "WebSocket already closed");
                return Ok(None);
            }
            Err(WsError::Capacity(CapacityError::MessageTooLong { size, max_size })) => {
                error!(
                    connection_id = %conn_id,
                    size,
                    max_size,
                    "Inbound frame exceeds size limit"
                );
                return Err(TransportError::FrameTooLarge {
                    size,
                    max: max_size,
                });
            }
            Err(e) => {
                error!(connection_id = %conn_id, "WebSocket read error: {}", e);
                return Err(TransportError::WebSocket(e));
            }
        }
    }

    debug!(connection_id = %conn_id, "WebSocket stream ended");
    Ok(None)
}
