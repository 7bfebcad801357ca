//! Session driver

use std::future::Future;
use tokio::io::AsyncWrite;
use tracing::{debug, error, info, warn};
use wsrelay_proto::{ErrorEvent, LineSink};
use wsrelay_transport::Connection;

use crate::config::{SessionConfig, TerminationPolicy};
use crate::error::SessionError;
use crate::inbound::{forward_inbound, InboundExit};
use crate::outbound::forward_outbound;
use crate::reader::LineSource;

/// How a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The remote closed the connection
    RemoteClosed,
    /// Local input finished first and the policy ended the session
    InputFinished(InboundExit),
    /// The shutdown signal fired
    Interrupted,
}

/// One relay session: a connection, its handshake, and both forwarders
///
/// Remote traffic, handshake frames and fatal errors go to the output sink;
/// local input problems go to the error sink.
pub struct Session<O, E> {
    config: SessionConfig,
    output: LineSink<O>,
    errors: LineSink<E>,
}

impl<O, E> Session<O, E>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    pub fn new(config: SessionConfig, output: O, errors: E) -> Self {
        Self {
            config,
            output: LineSink::new("stdout", output),
            errors: LineSink::new("stderr", errors),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the session to completion
    ///
    /// On failure an error event carrying the error message is written to
    /// the output sink before the error is returned.
    pub async fn run<F>(
        &mut self,
        lines: LineSource,
        shutdown: F,
    ) -> Result<SessionEnd, SessionError>
    where
        F: Future<Output = ()>,
    {
        match self.drive(lines, shutdown).await {
            Ok(end) => {
                info!(end = ?end, "Session ended");
                Ok(end)
            }
            Err(e) => {
                error!("Session failed: {}", e);
                if let Err(sink_err) = self.output.emit(&ErrorEvent::new(e.to_string())).await {
                    warn!("Failed to report session failure: {}", sink_err);
                }
                Err(e)
            }
        }
    }

    async fn drive<F>(
        &mut self,
        mut lines: LineSource,
        shutdown: F,
    ) -> Result<SessionEnd, SessionError>
    where
        F: Future<Output = ()>,
    {
        let mut connection = Connection::connect(&self.config.connection).await?;
        connection
            .handshake(&self.config.access_token, &mut self.output)
            .await?;

        let (mut sender, mut receiver) = connection.split()?;
        let policy = self.config.termination;
        let output = &mut self.output;
        let errors = &mut self.errors;

        let result = {
            let inbound = forward_inbound(&mut lines, &mut sender, errors);
            let outbound = forward_outbound(&mut receiver, output);
            tokio::pin!(inbound, outbound, shutdown);

            tokio::select! {
                exit = &mut inbound => match exit {
                    Ok(exit) if policy == TerminationPolicy::RemoteOnly => {
                        debug!(exit = ?exit, "Local input finished, waiting for remote to close");
                        tokio::select! {
                            done = &mut outbound => done.map(|_| SessionEnd::RemoteClosed),
                            _ = &mut shutdown => Ok(SessionEnd::Interrupted),
                        }
                    }
                    Ok(exit) => Ok(SessionEnd::InputFinished(exit)),
                    Err(e) => Err(e),
                },
                done = &mut outbound => done.map(|_| SessionEnd::RemoteClosed),
                _ = &mut shutdown => Ok(SessionEnd::Interrupted),
            }
        };

        if let Err(e) = sender.close().await {
            debug!("Error closing connection: {}", e);
        }

        result
    }
}
