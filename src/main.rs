//! USB-HID relay board CLI
//!
//! A command-line interface for switching relay channels and managing the
//! board serial number.

use clap::Parser;
use hidrelay::{IoStatus, RelayConfig};
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = RelayConfig {
        report_layout: cli.report_layout,
    };
    let device = cli.device.as_deref();

    match cli.command {
        None => commands::query::list(false, false)?,
        Some(Commands::List { json, all }) => commands::query::list(json, all)?,
        Some(Commands::On { channel }) => {
            commands::set::switch(device, config, channel, IoStatus::On)?;
        }
        Some(Commands::Off { channel }) => {
            commands::set::switch(device, config, channel, IoStatus::Off)?;
        }
        Some(Commands::Status { json }) => commands::query::status(device, config, json)?,
        Some(Commands::Serial) => commands::query::serial(device, config)?,
        Some(Commands::SetSerial { serial }) => {
            commands::set::set_serial(device, config, &serial)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "hidrelay=debug,hidrelay_transport=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
