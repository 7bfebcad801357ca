//! Shared test fixtures: an in-process WebSocket server and a session
//! harness wired to in-memory sinks
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream, Lines};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use wsrelay_session::{Session, SessionConfig, SessionEnd, SessionError};

const TIMEOUT: Duration = Duration::from_secs(5);

/// What the server observed from the client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Message(Value),
    Closed,
}

/// Single-connection WebSocket server driven by the test
pub struct MockServer {
    pub url: String,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    actions: mpsc::UnboundedSender<WsMessage>,
}

impl MockServer {
    /// Listen on an ephemeral port and send `greeting` to the first client
    pub async fn start(greeting: Value) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (actions, mut actions_rx) = mpsc::unbounded_channel::<WsMessage>();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(WsMessage::Text(greeting.to_string())).await.unwrap();

            loop {
                tokio::select! {
                    incoming = ws.next() => match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            let value = serde_json::from_str(&text).unwrap();
                            let _ = events_tx.send(ServerEvent::Message(value));
                        }
                        Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => {
                            let _ = events_tx.send(ServerEvent::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                    action = actions_rx.recv() => match action {
                        Some(msg) => {
                            if ws.send(msg).await.is_err() {
                                let _ = events_tx.send(ServerEvent::Closed);
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Self {
            url: format!("ws://{}/api/websocket", addr),
            events,
            actions,
        }
    }

    pub fn send(&self, msg: WsMessage) {
        self.actions.send(msg).unwrap();
    }

    pub fn send_json(&self, value: Value) {
        self.send(WsMessage::Text(value.to_string()));
    }

    pub fn send_text(&self, text: &str) {
        self.send(WsMessage::Text(text.to_string()));
    }

    pub fn close(&self) {
        self.send(WsMessage::Close(None));
    }

    pub async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for server event")
            .expect("server task ended")
    }

    pub async fn next_message(&mut self) -> Value {
        match self.next_event().await {
            ServerEvent::Message(value) => value,
            ServerEvent::Closed => panic!("client closed the connection"),
        }
    }
}

/// A running session with handles on its input and both sinks
pub struct Harness {
    input: Option<mpsc::Sender<io::Result<String>>>,
    pub output: Lines<BufReader<DuplexStream>>,
    pub errors: Lines<BufReader<DuplexStream>>,
    task: JoinHandle<Result<SessionEnd, SessionError>>,
}

impl Harness {
    pub fn start(config: SessionConfig) -> Self {
        let (input_tx, input_rx) = mpsc::channel(16);
        let (output_w, output_r) = tokio::io::duplex(1 << 20);
        let (errors_w, errors_r) = tokio::io::duplex(1 << 20);

        let task = tokio::spawn(async move {
            let mut session = Session::new(config, output_w, errors_w);
            session.run(input_rx, std::future::pending()).await
        });

        Self {
            input: Some(input_tx),
            output: BufReader::new(output_r).lines(),
            errors: BufReader::new(errors_r).lines(),
            task,
        }
    }

    pub async fn write_line(&self, line: &str) {
        self.input
            .as_ref()
            .expect("input already closed")
            .send(Ok(format!("{}\n", line)))
            .await
            .unwrap();
    }

    pub async fn fail_input(&self, message: &str) {
        self.input
            .as_ref()
            .expect("input already closed")
            .send(Err(io::Error::new(io::ErrorKind::Other, message.to_string())))
            .await
            .unwrap();
    }

    /// Simulate end of file on local input
    pub fn close_input(&mut self) {
        self.input.take();
    }

    pub async fn next_output(&mut self) -> String {
        next_line(&mut self.output).await
    }

    pub async fn next_output_json(&mut self) -> Value {
        serde_json::from_str(&self.next_output().await).unwrap()
    }

    pub async fn next_error_json(&mut self) -> Value {
        serde_json::from_str(&next_line(&mut self.errors).await).unwrap()
    }

    /// Remaining output lines once the session has ended
    pub async fn drain_output(&mut self) -> Vec<Value> {
        let mut lines = Vec::new();
        while let Some(line) = tokio::time::timeout(TIMEOUT, self.output.next_line())
            .await
            .expect("timed out draining output")
            .unwrap()
        {
            lines.push(serde_json::from_str(&line).unwrap());
        }
        lines
    }

    pub async fn finish(&mut self) -> Result<SessionEnd, SessionError> {
        tokio::time::timeout(TIMEOUT, &mut self.task)
            .await
            .expect("session did not finish")
            .expect("session task panicked")
    }
}

async fn next_line(lines: &mut Lines<BufReader<DuplexStream>>) -> String {
    tokio::time::timeout(TIMEOUT, lines.next_line())
        .await
        .expect("timed out waiting for a line")
        .unwrap()
        .expect("sink closed")
}
