//! Monitor commands
//!
//! Jump, write-memory and read/validate-memory expressed as sequences of
//! session calls plus the rules for interpreting the monitor's hex dumps.

use super::codec::{format_hex_bytes, format_row, row_width, ROW_BYTES};
use super::error::{MonitorError, Result};
use super::session::{Session, SessionConfig};
use super::transport::Link;
use std::fmt;
use std::str::FromStr;

/// Largest transfer the 16-bit address space allows
pub const MAX_TRANSFER: usize = 0x1_0000;

/// Remaining bytes above which a read requests a full page
const PAGE_THRESHOLD: usize = 48;

/// Rows returned for a `..` page request
const PAGE_ROWS: usize = 16;

/// Address in the monitor's 16-bit address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u16);

impl Address {
    /// Create an address
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Address `by` bytes further on, wrapping at the top of memory
    #[must_use]
    pub fn offset(self, by: usize) -> Self {
        Self(self.0.wrapping_add((by % MAX_TRANSFER) as u16))
    }
}

impl From<u16> for Address {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl FromStr for Address {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.is_empty()
            || digits.len() > 4
            || !digits.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(MonitorError::Usage(format!(
                "invalid address '{s}': expected up to 4 hex digits"
            )));
        }
        u16::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| MonitorError::Usage(format!("invalid address '{s}': {e}")))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// What a memory read does with the rows it receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRequest<'a> {
    /// Hand `length` bytes worth of rows to the caller
    Dump {
        /// Number of bytes to read
        length: usize,
    },
    /// Compare every row against `payload`
    Verify {
        /// Reference data
        payload: &'a [u8],
    },
}

impl<'a> ReadRequest<'a> {
    /// Build a request from exactly one of a length or a reference payload
    pub fn new(length: Option<usize>, payload: Option<&'a [u8]>) -> Result<Self> {
        match (length, payload) {
            (Some(length), None) => Ok(Self::Dump { length }),
            (None, Some(payload)) => Ok(Self::Verify { payload }),
            _ => Err(MonitorError::Usage(
                "either a length or a payload must be given (mutually exclusive)".to_string(),
            )),
        }
    }

    /// Number of bytes covered
    pub fn len(&self) -> usize {
        match self {
            Self::Dump { length } => *length,
            Self::Verify { payload } => payload.len(),
        }
    }

    /// Does the request cover no bytes?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_length(length: usize) -> Result<()> {
    if length > MAX_TRANSFER {
        return Err(MonitorError::Usage(format!(
            "{length} bytes exceed the {MAX_TRANSFER} byte address space"
        )));
    }
    Ok(())
}

/// Memory monitor driven over a [`Session`]
pub struct Monitor {
    session: Session,
}

impl Monitor {
    /// Wrap an established session
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Connect a session over `link`
    pub fn connect(link: Box<dyn Link>, config: SessionConfig) -> Result<Self> {
        Ok(Self::new(Session::connect(link, config)?))
    }

    /// Underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Underlying session, mutably
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Unwrap the session
    pub fn into_session(self) -> Session {
        self.session
    }

    /// See [`Session::initialize`]
    pub fn initialize(&mut self) -> Result<()> {
        self.session.initialize()
    }

    /// See [`Session::set_echo`]
    pub fn set_echo(&mut self, enabled: bool) -> Result<()> {
        self.session.set_echo(enabled)
    }

    /// See [`Session::set_screen`]
    pub fn set_screen(&mut self, enabled: bool) -> Result<()> {
        self.session.set_screen(enabled)
    }

    /// Start executing at `address`
    pub fn jump_to(&mut self, address: Address) -> Result<()> {
        self.session.send_line(&format!("J {address}"))?;
        self.session.expect_prompt()
    }

    /// Write `payload` starting at `address`, 16 bytes per command
    ///
    /// The first row carries the address; the monitor keeps a write cursor so
    /// later rows use the `:` continuation form.
    pub fn write_memory(&mut self, address: Address, payload: &[u8]) -> Result<()> {
        check_length(payload.len())?;
        for (i, row) in payload.chunks(ROW_BYTES).enumerate() {
            let line = if i == 0 {
                format!("w {address} {}", format_hex_bytes(row))
            } else {
                format!(":{}", format_hex_bytes(row))
            };
            self.session.send_line(&line)?;
            self.session.expect_prompt()?;
        }
        Ok(())
    }

    /// Read memory at `address`, either dumping rows into `sink` or
    /// verifying them against a payload
    pub fn read_memory<F>(
        &mut self,
        address: Address,
        request: ReadRequest<'_>,
        mut sink: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        let length = request.len();
        check_length(length)?;

        let mut cursor = 0;
        while cursor < length {
            let page = length - cursor > PAGE_THRESHOLD;
            let (token, rows) = if page { ("..", PAGE_ROWS) } else { (".", 1) };

            if cursor == 0 {
                self.session.send_line(&format!("r {address} {token}"))?;
            } else {
                self.session.send_line(token)?;
            }

            for row in 0..rows {
                let offset = cursor + row * ROW_BYTES;
                let line = self.session.next_line()?;
                let row_address = address.offset(offset);
                if offset >= length {
                    tracing::debug!("Skipping {}", row_address);
                    continue;
                }

                let valid = (length - offset).min(ROW_BYTES);
                let received: String = line.as_str().chars().take(row_width(valid)).collect();

                match request {
                    ReadRequest::Verify { payload } => {
                        let expected =
                            format_row(row_address.value(), &payload[offset..offset + valid]);
                        tracing::debug!("Checking {}", row_address);
                        if received != expected {
                            tracing::warn!("M: {}", received);
                            tracing::warn!("E: {}", expected);
                            return Err(MonitorError::mismatch(expected, received));
                        }
                    }
                    ReadRequest::Dump { .. } => sink(&received),
                }
            }

            cursor += rows * ROW_BYTES;
            self.session.expect_prompt()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::tests::fast_config;
    use crate::core::simulator::{FaultConfig, SimulatedMonitor, SimulatorConfig};

    fn simulated(faults: FaultConfig) -> (SimulatedMonitor, Monitor) {
        let sim = SimulatedMonitor::new(SimulatorConfig {
            faults,
            ..Default::default()
        });
        let mut monitor = Monitor::connect(Box::new(sim.link()), fast_config()).unwrap();
        monitor.initialize().unwrap();
        monitor.set_echo(false).unwrap();
        (sim, monitor)
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    fn reads(sim: &SimulatedMonitor) -> Vec<String> {
        sim.commands()
            .into_iter()
            .filter(|c| c.starts_with('r') || c.starts_with('.'))
            .collect()
    }

    #[test]
    fn test_address_parse_and_display() {
        assert_eq!("8000".parse::<Address>().unwrap(), Address::new(0x8000));
        assert_eq!("c000".parse::<Address>().unwrap().to_string(), "C000");
        assert_eq!("0x1f".parse::<Address>().unwrap().to_string(), "001F");
        assert!("12345".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
        assert!("zz".parse::<Address>().is_err());
        assert!("+1".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_offset_wraps() {
        assert_eq!(Address::new(0xFFF8).offset(16), Address::new(0x0008));
    }

    #[test]
    fn test_read_request_is_exclusive() {
        let data = [1u8, 2, 3];
        assert!(matches!(
            ReadRequest::new(Some(3), Some(&data)),
            Err(MonitorError::Usage(_))
        ));
        assert!(matches!(ReadRequest::new(None, None), Err(MonitorError::Usage(_))));
        assert_eq!(ReadRequest::new(None, Some(&data)).unwrap().len(), 3);
    }

    #[test]
    fn test_write_then_verify_single_row() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        let address = Address::new(0x8000);
        let data = [0xDE, 0xAD, 0xBE, 0xEF];

        monitor.write_memory(address, &data).unwrap();
        assert_eq!(sim.commands().last().unwrap(), "w 8000 DE AD BE EF");
        assert_eq!(sim.memory(0x8000, 4), data.to_vec());

        monitor
            .read_memory(address, ReadRequest::Verify { payload: &data }, |_| {})
            .unwrap();
        assert_eq!(reads(&sim), vec!["r 8000 ."]);
    }

    #[test]
    fn test_write_uses_continuation_rows() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        monitor.write_memory(Address::new(0x1000), &payload(40)).unwrap();

        let writes: Vec<String> = sim
            .commands()
            .into_iter()
            .filter(|c| c.starts_with('w') || c.starts_with(':'))
            .collect();
        assert_eq!(writes.len(), 3);
        assert!(writes[0].starts_with("w 1000 03 0A"));
        assert!(writes[1].starts_with(':'));
        assert_eq!(writes[2].split(' ').count(), 8);
    }

    #[test]
    fn test_round_trip_sizes_and_wrap() {
        for &(start, len) in &[
            (0x8000u16, 0usize),
            (0x8000, 1),
            (0x8000, 16),
            (0x8000, 17),
            (0x8000, 48),
            (0x8000, 49),
            (0x2000, 300),
            (0xFFF8, 40),
        ] {
            let (_sim, mut monitor) = simulated(FaultConfig::default());
            let data = payload(len);
            let address = Address::new(start);
            monitor.write_memory(address, &data).unwrap();
            monitor
                .read_memory(address, ReadRequest::Verify { payload: &data }, |_| {})
                .unwrap_or_else(|e| panic!("{len} bytes at {address}: {e}"));
        }
    }

    #[test]
    fn test_round_trip_prompt_bytes() {
        let (_sim, mut monitor) = simulated(FaultConfig::default());
        let data = vec![0x3E; 20];
        let address = Address::new(0x8000);
        monitor.write_memory(address, &data).unwrap();
        monitor
            .read_memory(address, ReadRequest::Verify { payload: &data }, |_| {})
            .unwrap();
        monitor.jump_to(address).unwrap();
    }

    #[test]
    fn test_paging_threshold() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        monitor
            .read_memory(Address::new(0), ReadRequest::Dump { length: 48 }, |_| {})
            .unwrap();
        assert!(reads(&sim).iter().all(|c| !c.ends_with("..")));

        let (sim, mut monitor) = simulated(FaultConfig::default());
        monitor
            .read_memory(Address::new(0), ReadRequest::Dump { length: 49 }, |_| {})
            .unwrap();
        assert_eq!(reads(&sim), vec!["r 0000 .."]);
    }

    #[test]
    fn test_page_then_single_rows() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        monitor
            .read_memory(Address::new(0x4000), ReadRequest::Dump { length: 300 }, |_| {})
            .unwrap();
        assert_eq!(reads(&sim), vec!["r 4000 ..", ".", ".", "."]);
    }

    #[test]
    fn test_dump_truncates_rows() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        sim.load(0x8000, &[0xDE, 0xAD, 0xBE, 0xEF, 0x41, 0x42]);

        let mut rows = Vec::new();
        monitor
            .read_memory(Address::new(0x8000), ReadRequest::Dump { length: 20 }, |row| {
                rows.push(row.to_string());
            })
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "8000: DE AD BE EF 41 42 00 00 00 00 00 00 00 00 00 00");
        assert_eq!(rows[1], "8010: 00 00 00 00");
    }

    #[test]
    fn test_verify_reports_mismatch() {
        let (_sim, mut monitor) = simulated(FaultConfig {
            corrupt_address: Some(0x8012),
            ..Default::default()
        });
        let data = payload(32);
        monitor.write_memory(Address::new(0x8000), &data).unwrap();

        let request = ReadRequest::Verify { payload: &data };
        match monitor.read_memory(Address::new(0x8000), request, |_| {}) {
            Err(MonitorError::ProtocolMismatch { expected, actual }) => {
                assert!(expected.starts_with("8010: "));
                assert!(actual.starts_with("8010: "));
                assert_ne!(expected, actual);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_write_stops_at_first_failure() {
        let (sim, mut monitor) = simulated(FaultConfig {
            never_echo: true,
            ..Default::default()
        });
        monitor.set_echo(true).unwrap();
        let before = sim.commands().len();

        let result = monitor.write_memory(Address::new(0x8000), &payload(64));
        assert!(matches!(result, Err(MonitorError::ProtocolMismatch { .. })));
        assert_eq!(sim.commands().len(), before + 1);
    }

    #[test]
    fn test_oversized_transfer_is_usage_error() {
        let (_sim, mut monitor) = simulated(FaultConfig::default());
        let result = monitor.read_memory(
            Address::new(0),
            ReadRequest::Dump { length: MAX_TRANSFER + 1 },
            |_| {},
        );
        assert!(matches!(result, Err(MonitorError::Usage(_))));
    }

    #[test]
    fn test_jump() {
        let (sim, mut monitor) = simulated(FaultConfig::default());
        monitor.jump_to(Address::new(0xC000)).unwrap();
        assert_eq!(sim.jumps(), vec![0xC000]);
        assert_eq!(sim.commands().last().unwrap(), "J C000");
    }
}
