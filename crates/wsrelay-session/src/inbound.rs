//! Local input → remote forwarding

use tokio::io::AsyncWrite;
use tracing::{debug, error, info, trace};
use wsrelay_proto::{ErrorEvent, LineSink, Message};
use wsrelay_transport::ConnectionSender;

use crate::error::SessionError;
use crate::reader::LineSource;

/// Why the inbound forwarder stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundExit {
    /// Local input reached end of file
    InputClosed,
    /// Reading local input failed
    ReadFailed,
    /// A message could not be sent to the remote
    SendFailed,
}

/// Relay local input lines to the remote until input ends
///
/// Blank lines are skipped. Lines that are not valid JSON are reported on
/// `errors` and skipped. End of input, read failures and send failures are
/// reported on `errors` and end the loop with an [`InboundExit`]; only a
/// failure to write `errors` itself is returned as an error.
pub async fn forward_inbound<W>(
    lines: &mut LineSource,
    sender: &mut ConnectionSender,
    errors: &mut LineSink<W>,
) -> Result<InboundExit, SessionError>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = match lines.recv().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Local input read failed: {}", e);
                errors.emit(&ErrorEvent::read_failed(&e)).await?;
                return Ok(InboundExit::ReadFailed);
            }
            None => {
                info!(
                    forwarded = sender.messages_sent(),
                    "Local input closed"
                );
                errors.emit(&ErrorEvent::input_closed()).await?;
                return Ok(InboundExit::InputClosed);
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = match Message::parse(line) {
            Ok(message) => message,
            Err(e) => {
                debug!("Skipping malformed input line: {}", e);
                errors.emit(&ErrorEvent::invalid_json(&e)).await?;
                continue;
            }
        };

        if let Err(e) = sender.send_message(&message).await {
            error!("Failed to relay input to remote: {}", e);
            errors.emit(&ErrorEvent::read_failed(&e)).await?;
            return Ok(InboundExit::SendFailed);
        }

        trace!(
            message_type = message.message_type().unwrap_or_default(),
            "Relayed input message"
        );
    }
}
