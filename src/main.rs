//! wsrelay - Bridge a local JSON line stream to a WebSocket API
//!
//! Reads JSON messages from stdin and sends them to the remote service;
//! writes every message received from the remote to stdout.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::io::{BufReader, Write};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wsrelay_proto::{encode_line, ErrorEvent, DEFAULT_MAX_MESSAGE_SIZE};
use wsrelay_session::{
    LineReader, Session, SessionConfig, TerminationPolicy, DEFAULT_INPUT_BUFFER,
};

const PROGRAM: &str = "wsrelay";

/// wsrelay - Bridge a local JSON line stream to a WebSocket API
#[derive(Parser, Debug)]
#[command(name = "wsrelay")]
#[command(about = "Bridge stdin/stdout JSON lines to a WebSocket API")]
#[command(version)]
#[command(long_about = r#"
Connects to a WebSocket API, answers an `auth_required` greeting with the
given access token, and then relays messages in both directions:

  stdin  (one JSON message per line)  ->  WebSocket
  stdout (one JSON message per line)  <-  WebSocket

Errors are reported as {"type":"error","message":...} lines. Problems with
local input go to stderr; everything else goes to stdout.

EXAMPLES:
  # Home Assistant
  wsrelay ws://homeassistant.local:8123/api/websocket $HASS_TOKEN

  # Keep receiving events after stdin is closed
  wsrelay --keep-open-on-input-close wss://example.com/api/websocket $TOKEN

ENVIRONMENT VARIABLES:
  WSRELAY_MAX_MESSAGE_SIZE  Maximum inbound message size in bytes
  WSRELAY_INPUT_BUFFER      Number of input lines buffered ahead of the socket
  WSRELAY_KEEP_OPEN         Same as --keep-open-on-input-close
  RUST_LOG                  Log filter for diagnostics on stderr
"#)]
struct Cli {
    /// WebSocket URL of the remote API (ws:// or wss://)
    websocket_url: String,

    /// Access token sent when the server asks for authentication
    access_token: String,

    /// Maximum size of a single inbound message in bytes
    #[arg(long, env = "WSRELAY_MAX_MESSAGE_SIZE", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Number of input lines buffered ahead of the socket
    #[arg(long, env = "WSRELAY_INPUT_BUFFER", default_value_t = DEFAULT_INPUT_BUFFER)]
    input_buffer: usize,

    /// Keep relaying remote messages after stdin is closed
    #[arg(long, env = "WSRELAY_KEEP_OPEN")]
    keep_open_on_input_close: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let termination = if self.keep_open_on_input_close {
            TerminationPolicy::RemoteOnly
        } else {
            TerminationPolicy::EitherDirection
        };

        SessionConfig::new(&self.websocket_url, &self.access_token)
            .with_max_message_size(self.max_message_size)
            .with_input_buffer(self.input_buffer)
            .with_termination(termination)
    }
}

/// Usage error to report for a failed parse, or `None` for --help/--version
fn usage_error(err: &clap::Error) -> Option<ErrorEvent> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(ErrorEvent::usage(PROGRAM)),
    }
}

/// Setup logging with the specified log level
///
/// Diagnostics go to stderr; stdout carries only protocol lines.
fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log level: {}", log_level))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Write an error event straight to stdout, outside any session
fn report(event: &ErrorEvent) {
    if let Ok(line) = encode_line(event) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(&line);
        let _ = stdout.flush();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match usage_error(&err) {
            Some(event) => {
                report(&event);
                return ExitCode::from(1);
            }
            None => err.exit(),
        },
    };

    if let Err(e) = setup_logging(&cli.log_level) {
        report(&ErrorEvent::new(format!("{:#}", e)));
        return ExitCode::from(1);
    }

    let config = cli.session_config();
    debug!(config = ?config, "Starting relay");

    let lines = match LineReader::new(config.input_buffer).spawn(BufReader::new(std::io::stdin()))
    {
        Ok(lines) => lines,
        Err(e) => {
            error!("Failed to start input reader: {}", e);
            report(&ErrorEvent::new(format!("Failed to start input reader: {}", e)));
            return ExitCode::from(1);
        }
    };

    let mut session = Session::new(config, tokio::io::stdout(), tokio::io::stderr());
    match session.run(lines, shutdown_signal()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}
