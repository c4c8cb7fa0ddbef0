//! Command/response session with the monitor
//!
//! A Session owns the write side of the link and the background line reader.
//! Commands are strictly request/response: one command is written, then
//! exactly the lines its semantics dictate are consumed.

use super::codec::encode_cp1252;
use super::error::{MonitorError, Result};
use super::line_reader::{Line, LineReader, PROMPT};
use super::transport::Link;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Protocol timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for each response line
    pub line_timeout: Duration,
    /// Quiet period that ends a discard of stale lines
    pub discard_window: Duration,
    /// Delay after each written byte while the monitor echoes
    pub echo_delay: Duration,
    /// Pause around closing and reopening the link
    pub settle_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            line_timeout: Duration::from_secs(1),
            discard_window: Duration::from_millis(100),
            echo_delay: Duration::from_micros(500),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// What the session knows about the monitor's echo setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoState {
    /// Not set yet; power-up default is unknown, responses may be echo or empty
    #[default]
    Unconfirmed,
    /// Confirmed on
    Enabled,
    /// Confirmed off
    Disabled,
}

impl EchoState {
    /// Writes must be throttled unless echo is known to be off
    pub fn paces_writes(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for EchoState {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Active monitor session
pub struct Session {
    link: Box<dyn Link>,
    reader: LineReader,
    config: SessionConfig,
    echo: EchoState,
    screen: Option<bool>,
}

impl Session {
    /// Reset the link, start the line reader and drop any banner noise
    pub fn connect(mut link: Box<dyn Link>, config: SessionConfig) -> Result<Self> {
        tracing::info!("Connecting to {}", link.connection_info());
        cycle_link(link.as_mut(), config.settle_delay)?;
        let reader = LineReader::start(link.try_clone_reader()?)?;

        let session = Self {
            link,
            reader,
            config,
            echo: EchoState::Unconfirmed,
            screen: None,
        };
        session.reader.discard_pending(session.config.discard_window);
        Ok(session)
    }

    /// Close and reopen the link after the remote device was reset
    ///
    /// The echo and screen settings are forgotten since the device restarted.
    pub fn reconnect(&mut self) -> Result<()> {
        tracing::info!("Reconnecting to {}", self.link.connection_info());
        self.reader.stop();
        cycle_link(self.link.as_mut(), self.config.settle_delay)?;
        self.reader = LineReader::start(self.link.try_clone_reader()?)?;
        self.reader.discard_pending(self.config.discard_window);
        self.echo = EchoState::Unconfirmed;
        self.screen = None;
        Ok(())
    }

    /// Write raw bytes one at a time, pacing them while the monitor echoes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let pace = self.echo.paces_writes();
        for &byte in bytes {
            self.link.write_all(&[byte])?;
            self.link.flush()?;
            if pace {
                thread::sleep(self.config.echo_delay);
            }
        }
        Ok(())
    }

    /// Pop the next response line
    pub fn next_line(&self) -> Result<Line> {
        self.reader.next_line(self.config.line_timeout)
    }

    /// Require the next line to be the prompt
    pub fn expect_prompt(&self) -> Result<()> {
        let line = self.next_line()?;
        if line.is_prompt() {
            Ok(())
        } else {
            Err(MonitorError::mismatch(PROMPT, line.into_string()))
        }
    }

    /// Send a command line and check its echo (or empty acknowledgement)
    pub fn send_line(&mut self, text: &str) -> Result<()> {
        tracing::info!("O: {}", text);
        let mut bytes = encode_cp1252(text);
        bytes.push(b'\n');
        self.write_bytes(&bytes)?;

        let response = self.next_line()?;
        let accepted = match self.echo {
            EchoState::Enabled => response == text,
            EchoState::Disabled => response.as_str().is_empty(),
            EchoState::Unconfirmed => response.as_str().is_empty() || response == text,
        };
        if accepted {
            return Ok(());
        }

        let expected = match self.echo {
            EchoState::Disabled => String::new(),
            _ => text.to_string(),
        };
        Err(MonitorError::mismatch(expected, response.into_string()))
    }

    /// Wake the monitor and wait for its prompt
    pub fn initialize(&mut self) -> Result<()> {
        self.write_bytes(b"\n")?;
        let greeting = self.next_line()?;
        tracing::debug!("Ignoring startup line '{}'", greeting);
        self.expect_prompt()
    }

    /// Switch the monitor's echo on or off
    pub fn set_echo(&mut self, enabled: bool) -> Result<()> {
        let value = u8::from(enabled);
        self.send_line(&format!("E {value}"))?;
        self.expect_line(&format!("E:0{value}"))?;
        self.expect_prompt()?;
        self.echo = EchoState::from(enabled);
        Ok(())
    }

    /// Switch the monitor's screen output on or off
    ///
    /// The screen should be off while uploading or validating: display
    /// refresh interferes with transfer timing. This also selects 80 columns.
    pub fn set_screen(&mut self, enabled: bool) -> Result<()> {
        let value = u8::from(enabled);
        self.send_line(&format!("S {value}"))?;
        self.expect_line(&format!("S:0{value}"))?;
        self.expect_prompt()?;
        self.screen = Some(enabled);
        Ok(())
    }

    /// Current echo knowledge
    pub fn echo_state(&self) -> EchoState {
        self.echo
    }

    /// Last confirmed screen setting
    pub fn screen_state(&self) -> Option<bool> {
        self.screen
    }

    /// Protocol timing in use
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get connection info string
    pub fn connection_info(&self) -> String {
        self.link.connection_info()
    }

    /// Stop the line reader, then close the link
    pub fn close(self) {
        drop(self);
    }

    fn expect_line(&self, expected: &str) -> Result<()> {
        let line = self.next_line()?;
        if line == expected {
            Ok(())
        } else {
            Err(MonitorError::mismatch(expected, line.into_string()))
        }
    }

    fn shutdown(&mut self) {
        self.reader.stop();
        self.link.close();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The link is unusable right after the device resets until it has been
/// closed and reopened with pauses in between.
fn cycle_link(link: &mut dyn Link, delay: Duration) -> Result<()> {
    link.open()?;
    thread::sleep(delay);
    link.close();
    thread::sleep(delay);
    link.open()?;
    thread::sleep(delay);
    Ok(())
}
