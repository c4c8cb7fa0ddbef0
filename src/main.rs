//! Monload - serial uploader for the memory monitor firmware
//!
//! Reads, writes or uploads memory through the monitor's text protocol
//! over a serial port.

use anyhow::Context;
use clap::Parser;
use monload_core::cli::{run, Cli, CliResult};
use monload_core::{Link, Monitor, SerialLink, SimulatedMonitor, SimulatorConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --debug traces every byte and line on the link
    let level = if cli.debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match execute(&cli) {
        Ok(()) => CliResult::success(),
        Err(e) => {
            tracing::error!("{:#}", e);
            CliResult::from_error(&e)
        }
    };
    result.to_exit_code()
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.app_config()?;
    let job = cli.job()?;

    let link: Box<dyn Link> = if cli.simulate {
        tracing::info!("Using simulated monitor");
        Box::new(SimulatedMonitor::new(SimulatorConfig::default()).link())
    } else {
        let serial = config.serial_config();
        tracing::info!("Opening {} at {} baud", serial.port, serial.baud_rate);
        Box::new(SerialLink::new(serial))
    };

    let mut monitor = Monitor::connect(link, config.session_config())
        .context("connecting to monitor")?;
    tracing::info!("Connected: {}", monitor.session().connection_info());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&mut monitor, &job, &mut out)?;

    monitor.into_session().close();
    Ok(())
}
