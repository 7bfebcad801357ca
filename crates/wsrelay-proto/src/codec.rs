//! Newline-delimited JSON codec for the local streams
//!
//! Every record is written as one compact JSON document followed by `\n`,
//! and the writer is flushed after each record so a reader on the other end
//! of a pipe sees it immediately.

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {sink}: {source}")]
    Io {
        sink: &'static str,
        source: std::io::Error,
    },
}

/// Encode a record as one newline-terminated line
pub fn encode_line<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, CodecError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(line)
}

/// Line-oriented destination for structured records (stdout, stderr)
#[derive(Debug)]
pub struct LineSink<W> {
    name: &'static str,
    writer: W,
    records: u64,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub fn new(name: &'static str, writer: W) -> Self {
        Self {
            name,
            writer,
            records: 0,
        }
    }

    /// Write one record and flush
    pub async fn emit<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<(), CodecError> {
        let line = encode_line(record)?;

        self.writer
            .write_all(&line)
            .await
            .map_err(|source| CodecError::Io {
                sink: self.name,
                source,
            })?;
        self.writer.flush().await.map_err(|source| CodecError::Io {
            sink: self.name,
            source,
        })?;

        self.records += 1;
        trace!(sink = self.name, bytes = line.len(), "Emitted record");
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
