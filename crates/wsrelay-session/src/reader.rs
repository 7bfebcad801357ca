//! Blocking line reader for the local input stream

use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Lines read from the local input stream
///
/// The channel closes at end of file. A read error is delivered once and
/// then the channel closes.
pub type LineSource = mpsc::Receiver<io::Result<String>>;

/// Reads lines on a dedicated OS thread and hands them to async code over
/// a bounded channel
///
/// The thread is not part of the runtime's blocking pool: a read that never
/// returns must not hold up runtime shutdown.
#[derive(Debug, Clone)]
pub struct LineReader {
    capacity: usize,
    thread_name: String,
}

impl LineReader {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            thread_name: "wsrelay-stdin".to_string(),
        }
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Start reading `reader` in the background
    pub fn spawn<R>(self, reader: R) -> io::Result<LineSource>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.capacity);

        thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || read_lines(reader, tx))?;

        Ok(rx)
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<io::Result<String>>) {
    let mut count = 0u64;

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!(lines = count, "Input stream reached end of file");
                break;
            }
            Ok(_) => {
                count += 1;
                if tx.blocking_send(Ok(line)).is_err() {
                    debug!("Line consumer dropped, stopping input reader");
                    break;
                }
            }
            Err(e) => {
                warn!("Input read error: {}", e);
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    }
}
