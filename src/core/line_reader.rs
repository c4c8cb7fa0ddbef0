//! Background line reader
//!
//! Drains the link one byte at a time on its own thread and publishes
//! complete lines (or bare prompt markers) on an unbounded channel. Byte
//! granularity is required: the prompt `>` carries no terminator.

use super::codec::decode_cp1252;
use super::error::{MonitorError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Prompt marker printed by the monitor when it is ready for a command
pub const PROMPT: &str = ">";

/// A decoded, whitespace-trimmed response line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line(String);

impl Line {
    /// Create a line from text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the line text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Is this the bare prompt marker?
    pub fn is_prompt(&self) -> bool {
        self.0 == PROMPT
    }

    /// Consume into the owned text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Line {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Accumulates raw bytes until a line terminator or prompt marker arrives
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a line when `byte` completes one
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        self.buffer.push(byte);
        if byte != b'\n' && byte != b'>' {
            return None;
        }
        let line = Line::new(decode_cp1252(&self.buffer).trim());
        self.buffer.clear();
        Some(line)
    }

    /// Bytes received since the last emitted line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

/// Line reader running on a dedicated thread
pub struct LineReader {
    lines: Receiver<Line>,
    running: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl LineReader {
    /// Start reading from `source` on a new thread
    pub fn start(source: Box<dyn Read + Send>) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let failure = Arc::new(Mutex::new(None));

        let handle = thread::Builder::new().name("line-reader".to_string()).spawn({
            let running = running.clone();
            let failure = failure.clone();
            move || read_loop(source, &tx, &running, &failure)
        })?;

        Ok(Self {
            lines: rx,
            running,
            failure,
            handle: Some(handle),
        })
    }

    /// Pop the next line, waiting at most `timeout`
    pub fn next_line(&self, timeout: Duration) -> Result<Line> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Ok(line),
            Err(RecvTimeoutError::Timeout) => Err(MonitorError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(MonitorError::LinkClosed(self.failure_reason()))
            }
        }
    }

    /// Drop every queued line until the link has been quiet for `quiet_window`
    pub fn discard_pending(&self, quiet_window: Duration) -> usize {
        let mut discarded = 0;
        while let Ok(line) = self.lines.recv_timeout(quiet_window) {
            tracing::info!("Skipping: {}", line);
            discarded += 1;
        }
        discarded
    }

    /// Is the read loop still alive?
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Why the read loop ended, if it failed
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    /// Signal the read loop to end and wait for the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Line reader thread panicked");
            }
        }
    }

    fn failure_reason(&self) -> String {
        self.failure()
            .unwrap_or_else(|| "line reader stopped".to_string())
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(
    mut source: Box<dyn Read + Send>,
    tx: &Sender<Line>,
    running: &AtomicBool,
    failure: &Mutex<Option<String>>,
) {
    let mut assembler = LineAssembler::new();
    let mut byte = [0u8; 1];

    while running.load(Ordering::SeqCst) {
        match source.read(&mut byte) {
            Ok(0) => {
                tracing::error!("Link reached end of stream");
                *failure.lock() = Some("end of stream".to_string());
                break;
            }
            Ok(_) => {
                tracing::trace!("R: {:?}", char::from(byte[0]));
                if let Some(line) = assembler.push(byte[0]) {
                    tracing::debug!("R: \"{}\"", line);
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                tracing::error!("Serial error: {}", e);
                *failure.lock() = Some(e.to_string());
                break;
            }
        }
    }
}
