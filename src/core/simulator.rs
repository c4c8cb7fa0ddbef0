//! Simulated monitor firmware
//!
//! An in-process model of the memory monitor exposed as a [`Link`], for tests
//! and dry runs. It keeps 64 KiB of memory, the echo and screen toggles, a
//! write cursor for `:` continuation rows and a read cursor for `.`/`..`
//! continuation requests. Faults can be injected to exercise the protocol
//! checks.

use super::codec::{decode_cp1252, encode_cp1252, format_row, parse_hex_bytes, ROW_BYTES};
use super::transport::{Link, TransportError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

const MEMORY_SIZE: usize = 0x1_0000;
const PAGE_ROWS: usize = 16;

/// Fault injection configuration
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Never echo command lines, even with echo enabled
    pub never_echo: bool,
    /// Always echo command lines, even with echo disabled
    pub always_echo: bool,
    /// Reply with this text instead of the `E:0x` acknowledgement
    pub echo_ack_override: Option<String>,
    /// Flip every bit of the byte at this address when it is read back
    pub corrupt_address: Option<u16>,
    /// Noise printed every time the link is opened
    pub banner: Option<String>,
}

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Echo state after power-up
    pub initial_echo: bool,
    /// Per-read wait of the simulated link
    pub read_timeout: Duration,
    /// Injected faults
    pub faults: FaultConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_echo: true,
            read_timeout: Duration::from_millis(20),
            faults: FaultConfig::default(),
        }
    }
}

struct Firmware {
    config: SimulatorConfig,
    memory: Vec<u8>,
    echo: bool,
    screen: bool,
    write_cursor: u16,
    read_cursor: u16,
    pending: Vec<u8>,
    commands: Vec<String>,
    jumps: Vec<u16>,
    opens: usize,
    output: Option<Sender<u8>>,
}

impl Firmware {
    fn emit(&self, text: &str) {
        if let Some(ref tx) = self.output {
            for byte in encode_cp1252(text) {
                let _ = tx.send(byte);
            }
        }
    }

    fn receive(&mut self, byte: u8) {
        if byte == b'\n' {
            let raw = std::mem::take(&mut self.pending);
            self.execute(&decode_cp1252(&raw));
        } else {
            self.pending.push(byte);
        }
    }

    fn execute(&mut self, raw: &str) {
        let text = raw.trim();
        if text.is_empty() {
            self.emit("?\r\n>");
            return;
        }

        tracing::debug!("Simulator: {}", text);
        self.commands.push(text.to_string());

        let faults = &self.config.faults;
        let echo = !faults.never_echo && (faults.always_echo || self.echo);
        if echo {
            self.emit(text);
        }
        self.emit("\r\n");

        if self.dispatch(text).is_none() {
            self.emit("?\r\n");
        }
        self.emit(">");
    }

    fn dispatch(&mut self, text: &str) -> Option<()> {
        let mut chars = text.chars();
        let command = chars.next()?;
        let rest = chars.as_str();
        let mut args = rest.split_whitespace();

        match command {
            'J' => {
                let address = parse_address(args.next()?)?;
                self.jumps.push(address);
            }
            'E' => {
                let value = parse_flag(args.next()?)?;
                self.echo = value;
                let ack = self
                    .config
                    .faults
                    .echo_ack_override
                    .clone()
                    .unwrap_or_else(|| format!("E:0{}", u8::from(value)));
                self.emit(&format!("{ack}\r\n"));
            }
            'S' => {
                let value = parse_flag(args.next()?)?;
                self.screen = value;
                self.emit(&format!("S:0{}\r\n", u8::from(value)));
            }
            'w' => {
                let (address, data) = rest.trim_start().split_once(' ')?;
                self.write_cursor = parse_address(address)?;
                self.store(data)?;
            }
            ':' => self.store(rest)?,
            'r' => {
                self.read_cursor = parse_address(args.next()?)?;
                self.dump(args.next()?)?;
            }
            '.' => self.dump(text)?,
            _ => return None,
        }
        Some(())
    }

    fn store(&mut self, hex: &str) -> Option<()> {
        let data = parse_hex_bytes(hex).ok()?;
        if data.len() > ROW_BYTES {
            return None;
        }
        for byte in data {
            self.memory[usize::from(self.write_cursor)] = byte;
            self.write_cursor = self.write_cursor.wrapping_add(1);
        }
        Some(())
    }

    fn dump(&mut self, token: &str) -> Option<()> {
        let rows = match token {
            "." => 1,
            ".." => PAGE_ROWS,
            _ => return None,
        };
        for _ in 0..rows {
            let address = self.read_cursor;
            let mut row = [0u8; ROW_BYTES];
            for (i, slot) in row.iter_mut().enumerate() {
                let at = address.wrapping_add(i as u16);
                *slot = self.memory[usize::from(at)];
                if self.config.faults.corrupt_address == Some(at) {
                    *slot ^= 0xFF;
                }
            }
            let ascii: String = row
                .iter()
                .map(|&b| {
                    // `>` would end the line early on the host side
                    if b.is_ascii_graphic() && b != b'>' {
                        char::from(b)
                    } else {
                        '.'
                    }
                })
                .collect();
            self.emit(&format!("{}  {}\r\n", format_row(address, &row), ascii));
            self.read_cursor = address.wrapping_add(ROW_BYTES as u16);
        }
        Some(())
    }
}

fn parse_address(text: &str) -> Option<u16> {
    if text.len() != 4 {
        return None;
    }
    u16::from_str_radix(text, 16).ok()
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Handle to a simulated monitor
#[derive(Clone)]
pub struct SimulatedMonitor {
    firmware: Arc<Mutex<Firmware>>,
    output: Receiver<u8>,
    read_timeout: Duration,
}

impl SimulatedMonitor {
    /// Power up a simulated monitor
    pub fn new(config: SimulatorConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let read_timeout = config.read_timeout;
        let echo = config.initial_echo;
        let firmware = Firmware {
            config,
            memory: vec![0; MEMORY_SIZE],
            echo,
            screen: true,
            write_cursor: 0,
            read_cursor: 0,
            pending: Vec::new(),
            commands: Vec::new(),
            jumps: Vec::new(),
            opens: 0,
            output: Some(tx),
        };
        Self {
            firmware: Arc::new(Mutex::new(firmware)),
            output: rx,
            read_timeout,
        }
    }

    /// Create a closed link attached to this monitor
    pub fn link(&self) -> SimulatedLink {
        SimulatedLink {
            monitor: self.clone(),
            open: false,
        }
    }

    /// Preload memory
    pub fn load(&self, address: u16, data: &[u8]) {
        let mut fw = self.firmware.lock();
        for (i, &byte) in data.iter().enumerate() {
            let at = address.wrapping_add(i as u16);
            fw.memory[usize::from(at)] = byte;
        }
    }

    /// Read memory directly
    pub fn memory(&self, address: u16, len: usize) -> Vec<u8> {
        let fw = self.firmware.lock();
        (0..len)
            .map(|i| fw.memory[usize::from(address.wrapping_add(i as u16))])
            .collect()
    }

    /// Every non-empty command line received so far
    pub fn commands(&self) -> Vec<String> {
        self.firmware.lock().commands.clone()
    }

    /// Addresses jumped to so far
    pub fn jumps(&self) -> Vec<u16> {
        self.firmware.lock().jumps.clone()
    }

    /// Current echo setting
    pub fn echo(&self) -> bool {
        self.firmware.lock().echo
    }

    /// Current screen setting
    pub fn screen(&self) -> bool {
        self.firmware.lock().screen
    }

    /// How many times a link has opened the device
    pub fn open_count(&self) -> usize {
        self.firmware.lock().opens
    }

    /// Break the link: reads fail once drained, writes fail immediately
    pub fn unplug(&self) {
        self.firmware.lock().output = None;
    }

    fn is_unplugged(&self) -> bool {
        self.firmware.lock().output.is_none()
    }
}

/// [`Link`] endpoint of a [`SimulatedMonitor`]
pub struct SimulatedLink {
    monitor: SimulatedMonitor,
    open: bool,
}

impl Write for SimulatedLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "simulated link is closed"));
        }
        if self.monitor.is_unplugged() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated link unplugged"));
        }
        let mut fw = self.monitor.firmware.lock();
        for &byte in buf {
            fw.receive(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct SimulatedReader {
    output: Receiver<u8>,
    timeout: Duration,
}

impl Read for SimulatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.output.recv_timeout(self.timeout) {
            Ok(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            Err(RecvTimeoutError::Timeout) => Err(io::ErrorKind::TimedOut.into()),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated link unplugged",
            )),
        }
    }
}

impl Link for SimulatedLink {
    fn try_clone_reader(&self) -> Result<Box<dyn Read + Send>, TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        Ok(Box::new(SimulatedReader {
            output: self.monitor.output.clone(),
            timeout: self.monitor.read_timeout,
        }))
    }

    fn open(&mut self) -> Result<(), TransportError> {
        if !self.open {
            self.open = true;
            let mut fw = self.monitor.firmware.lock();
            fw.opens += 1;
            if let Some(banner) = fw.config.faults.banner.clone() {
                fw.emit(&format!("{banner}\r\n"));
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn connection_info(&self) -> String {
        "simulated monitor".to_string()
    }
}
