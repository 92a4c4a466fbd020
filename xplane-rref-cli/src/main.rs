//! X-Plane RREF Client CLI Application
//!
//! Command-line front end for the xplane-rref library. It adds:
//! - Optional TOML configuration and command-line overrides
//! - Logging setup
//! - Ctrl-C handling (graceful stop)
//! - Text or JSON change reports on stdout

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use xplane_rref::{UdpSession, UpdateDispatcher};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::Reporter;

/// X-Plane RREF client - subscribe to light and gear datarefs and print changes
#[derive(Parser, Debug)]
#[command(name = "xplane-rref-cli")]
#[command(about = "Print light switch and landing gear changes streamed by X-Plane", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Simulator host
    #[arg(long, value_name = "HOST")]
    sim_host: Option<String>,

    /// Simulator UDP port
    #[arg(long, value_name = "PORT")]
    sim_port: Option<u16>,

    /// Local UDP port to receive updates on
    #[arg(long, value_name = "PORT")]
    local_port: Option<u16>,

    /// Output format for change reports
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Cancel all subscriptions before exiting
    #[arg(long)]
    unsubscribe_on_stop: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("X-Plane RREF CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using client library v{}", xplane_rref::VERSION);

    let config = build_config(&args)?;
    log::debug!("Effective configuration: {:?}", config);

    let mut session = UdpSession::open(&config.client)
        .context("Failed to open UDP session")?;

    let stop = session.stop_signal();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        handler_stop.stop();
    })
    .context("Error setting Ctrl-C handler")?;

    let mut reporter = Reporter::new(config.output.format, io::stdout().lock());
    let mut dispatcher = UpdateDispatcher::new(&config.client);

    let result = dispatcher.run(&mut session, &stop, |change| {
        if let Err(e) = reporter.report(change) {
            log::warn!("Failed to write report: {}", e);
        }
    });
    session.close();

    match result {
        Ok(stats) => {
            reporter.summary(&stats)?;
            eprintln!("Client stopped");
            Ok(())
        }
        Err(e) => {
            eprintln!("Client terminated: {}", e);
            Err(e).context("Receive loop failed")
        }
    }
}

/// Merge the configuration file (if any) with command-line overrides
fn build_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(host) = &args.sim_host {
        config.client.sim_host = host.clone();
    }
    if let Some(port) = args.sim_port {
        config.client.sim_port = port;
    }
    if let Some(port) = args.local_port {
        config.client.local_port = port;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.unsubscribe_on_stop {
        config.client.unsubscribe_on_stop = true;
    }

    config::validate(&config.client)?;
    Ok(config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let args = Args::parse_from(["xplane-rref-cli"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.client, xplane_rref::ClientConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_command_line_overrides() {
        let args = Args::parse_from([
            "xplane-rref-cli",
            "--sim-host",
            "10.1.1.5",
            "--local-port",
            "20001",
            "--format",
            "json",
            "--unsubscribe-on-stop",
            "-vv",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.client.sim_host, "10.1.1.5");
        assert_eq!(config.client.sim_port, 49001);
        assert_eq!(config.client.local_port, 20001);
        assert!(config.client.unsubscribe_on_stop);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(args.verbose, 2);
    }
}
