//! End-to-end jobs against the simulated monitor

use monload_core::cli::{run, Job, UploadOptions, ValidationError};
use monload_core::{
    Address, CliResult, ExitCodes, FaultConfig, Monitor, SessionConfig, SimulatedMonitor,
    SimulatorConfig,
};
use std::time::Duration;

fn fast_config() -> SessionConfig {
    SessionConfig {
        line_timeout: Duration::from_millis(500),
        discard_window: Duration::from_millis(30),
        echo_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
    }
}

fn connect(faults: FaultConfig) -> (SimulatedMonitor, Monitor) {
    let sim = SimulatedMonitor::new(SimulatorConfig {
        faults,
        ..Default::default()
    });
    let monitor = Monitor::connect(Box::new(sim.link()), fast_config()).unwrap();
    (sim, monitor)
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 13 + 1) as u8).collect()
}

fn upload(address: u16, data: Vec<u8>, options: UploadOptions) -> Job {
    Job::Upload {
        address: Address::new(address),
        payload: data,
        options,
    }
}

#[test]
fn upload_writes_validates_and_restores_echo() {
    let (sim, mut monitor) = connect(FaultConfig::default());
    let data = payload(100);

    let mut out = Vec::new();
    run(&mut monitor, &upload(0x8000, data.clone(), UploadOptions::default()), &mut out).unwrap();

    assert_eq!(sim.memory(0x8000, data.len()), data);
    assert!(sim.echo());
    assert!(sim.screen());
    assert!(sim.jumps().is_empty());

    let commands = sim.commands();
    assert_eq!(&commands[..2], ["E 0", "S 0"]);
    assert!(commands[2].starts_with("w 8000 "));
    assert!(commands.contains(&"r 8000 ..".to_string()));
    assert_eq!(&commands[commands.len() - 2..], ["S 1", "E 1"]);
    assert!(out.is_empty());
}

#[test]
fn upload_with_jumps_leaves_echo_off() {
    let (sim, mut monitor) = connect(FaultConfig::default());
    let options = UploadOptions {
        jump_before: Some(Address::new(0xE000)),
        jump_after: Some(Address::new(0x8000)),
        screen_off: true,
        ..Default::default()
    };

    run(&mut monitor, &upload(0x8000, payload(16), options), &mut Vec::new()).unwrap();

    assert_eq!(sim.jumps(), vec![0xE000, 0x8000]);
    assert!(!sim.echo());
    assert!(!sim.screen());
    let commands = sim.commands();
    assert_eq!(commands.first().map(String::as_str), Some("J E000"));
    assert_eq!(commands.last().map(String::as_str), Some("J 8000"));
}

#[test]
fn validate_only_checks_existing_memory() {
    let (sim, mut monitor) = connect(FaultConfig::default());
    let data = payload(40);
    sim.load(0x4000, &data);

    let options = UploadOptions {
        upload: false,
        ..Default::default()
    };
    run(&mut monitor, &upload(0x4000, data, options), &mut Vec::new()).unwrap();

    assert!(!sim.commands().iter().any(|c| c.starts_with('w') || c.starts_with(':')));
}

#[test]
fn validation_mismatch_maps_to_validation_exit_code() {
    let (_sim, mut monitor) = connect(FaultConfig {
        corrupt_address: Some(0x8011),
        ..Default::default()
    });

    let job = upload(0x8000, payload(32), UploadOptions::default());
    let err = run(&mut monitor, &job, &mut Vec::new()).unwrap_err();

    assert!(err.downcast_ref::<ValidationError>().is_some());
    assert_eq!(CliResult::from_error(&err).code(), ExitCodes::VALIDATION_FAILED);
}

#[test]
fn read_job_prints_rows() {
    let (sim, mut monitor) = connect(FaultConfig::default());
    sim.load(0x1000, b"Hello, monitor!!ab");

    let mut out = Vec::new();
    let job = Job::Read {
        address: Address::new(0x1000),
        length: 18,
    };
    run(&mut monitor, &job, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Reading 18 bytes from 1000:");
    assert_eq!(
        lines[1],
        "1000: 48 65 6C 6C 6F 2C 20 6D 6F 6E 69 74 6F 72 21 21"
    );
    assert_eq!(lines[2], "1010: 61 62");
    assert_eq!(lines.len(), 3);
}

#[test]
fn write_job_stores_bytes() {
    let (sim, mut monitor) = connect(FaultConfig::default());

    let mut out = Vec::new();
    let job = Job::Write {
        address: Address::new(0xC000),
        data: vec![0xDE, 0xAD, 0xBE, 0xEF],
    };
    run(&mut monitor, &job, &mut out).unwrap();

    assert_eq!(sim.memory(0xC000, 4), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(String::from_utf8(out).unwrap(), "Writing deadbeef to C000:\n");
}

#[test]
fn unplugged_link_fails_with_connection_code() {
    let (sim, mut monitor) = connect(FaultConfig::default());
    sim.unplug();

    let job = Job::Read {
        address: Address::new(0),
        length: 1,
    };
    let err = run(&mut monitor, &job, &mut Vec::new()).unwrap_err();
    assert_eq!(CliResult::from_error(&err).code(), ExitCodes::CONNECTION_FAILED);
}
