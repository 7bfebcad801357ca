//! Remote → local output forwarding

use tokio::io::AsyncWrite;
use tracing::{debug, warn};
use wsrelay_proto::{ErrorEvent, LineSink};
use wsrelay_transport::ConnectionReceiver;

use crate::error::SessionError;

/// Why the outbound forwarder stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundExit {
    /// The remote closed the connection
    RemoteClosed,
}

/// Relay remote frames to `output` until the remote closes
///
/// A frame that is not valid JSON is reported on `output` as an error event
/// and skipped. Transport failures, including frames over the size limit,
/// are returned as errors.
pub async fn forward_outbound<W>(
    receiver: &mut ConnectionReceiver,
    output: &mut LineSink<W>,
) -> Result<OutboundExit, SessionError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = receiver.recv_frame().await? {
        match frame.parse() {
            Ok(message) => output.emit(&message).await?,
            Err(e) => {
                warn!(bytes = frame.len(), "Malformed frame from remote: {}", e);
                output.emit(&ErrorEvent::new(e.to_string())).await?;
            }
        }
    }

    debug!(
        frames = receiver.frames_received(),
        "Remote closed the connection"
    );
    Ok(OutboundExit::RemoteClosed)
}
