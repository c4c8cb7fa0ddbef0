//! Serial port transport implementation

use super::{Link, TransportError};
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Serial port parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl std::str::FromStr for SerialParity {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            other => Err(TransportError::InvalidConfiguration(format!(
                "unknown parity '{other}'"
            ))),
        }
    }
}

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port name (e.g., /dev/ttyUSB1, COM3)
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits (1, 2)
    pub stop_bits: u8,
    /// Parity
    pub parity: SerialParity,
    /// Per-read wait
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// Create a new serial configuration with 8N1 framing
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            read_timeout: Duration::from_millis(100),
        }
    }

    /// Set data bits
    #[must_use]
    pub fn data_bits(mut self, bits: u8) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set stop bits
    #[must_use]
    pub fn stop_bits(mut self, bits: u8) -> Self {
        self.stop_bits = bits;
        self
    }

    /// Set parity
    #[must_use]
    pub fn parity(mut self, parity: SerialParity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the per-read wait
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB1", 9600)
    }
}

/// Serial port link
pub struct SerialLink {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Create a closed link for the configured port
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// Open the configured serial port
    pub fn open(config: SerialConfig) -> Result<Self, TransportError> {
        let mut link = Self::new(config);
        Link::open(&mut link)?;
        Ok(link)
    }

    fn build_port(&self) -> Result<Box<dyn SerialPort>, TransportError> {
        let data_bits = match self.config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };

        let stop_bits = match self.config.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };

        let parity = match self.config.parity {
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
            SerialParity::None => Parity::None,
        };

        serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(FlowControl::None)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    TransportError::PortNotFound(self.config.port.clone())
                }
                serialport::ErrorKind::Io(io_kind) => match io_kind {
                    io::ErrorKind::NotFound => {
                        TransportError::PortNotFound(self.config.port.clone())
                    }
                    io::ErrorKind::PermissionDenied => {
                        TransportError::PermissionDenied(self.config.port.clone())
                    }
                    _ => TransportError::ConnectionFailed(e.to_string()),
                },
                _ => TransportError::ConnectionFailed(e.to_string()),
            })
    }

    fn port_mut(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is closed"))
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port_mut()?.flush()
    }
}

/// Read handle cloned from an open port
struct PortReader(Box<dyn SerialPort>);

impl Read for PortReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Link for SerialLink {
    fn try_clone_reader(&self) -> Result<Box<dyn Read + Send>, TransportError> {
        let port = self.port.as_ref().ok_or(TransportError::NotConnected)?;
        let clone = port
            .try_clone()
            .map_err(|e| TransportError::IoError(e.into()))?;
        Ok(Box::new(PortReader(clone)))
    }

    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_none() {
            let port = self.build_port()?;
            tracing::debug!("Opened {}", self.connection_info());
            self.port = Some(port);
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!("Closed {}", self.config.port);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn connection_info(&self) -> String {
        format!(
            "{} @ {} baud ({}{}{})",
            self.config.port,
            self.config.baud_rate,
            self.config.data_bits,
            match self.config.parity {
                SerialParity::None => "N",
                SerialParity::Odd => "O",
                SerialParity::Even => "E",
            },
            self.config.stop_bits,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_from_str() {
        assert_eq!("N".parse::<SerialParity>().unwrap(), SerialParity::None);
        assert_eq!("even".parse::<SerialParity>().unwrap(), SerialParity::Even);
        assert!("mark".parse::<SerialParity>().is_err());
    }

    #[test]
    fn test_default_is_monitor_framing() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.stop_bits, 1);
        assert_eq!(config.parity, SerialParity::None);
        assert_eq!(config.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let config = SerialConfig::new("/dev/monload-does-not-exist", 9600);
        assert!(SerialLink::open(config).is_err());
    }
}
