//! Query command handlers.

use super::{with_relay, CommandResult};
use hidrelay::{HidApiBackend, RelayConfig, RelayDescriptor};
use serde_json::json;

fn describe(relay: &RelayDescriptor) -> String {
    let info = relay.info();
    format!(
        "VID={:04X} PID={:04X} product={} usb_serial={} path={}",
        info.vid,
        info.pid,
        info.product_name.as_deref().unwrap_or("?"),
        info.serial.as_deref().unwrap_or("-"),
        info.device_path,
    )
}

/// List relay boards
pub fn list(as_json: bool, all: bool) -> CommandResult {
    let backend = HidApiBackend::new()?;

    if !all {
        let relays = hidrelay::list(&backend);
        if as_json {
            println!("{}", serde_json::to_string_pretty(&relays)?);
            return Ok(());
        }
        if relays.is_empty() {
            println!("No relay boards found");
        }
        for relay in &relays {
            println!("  {}", describe(relay));
        }
        return Ok(());
    }

    let report = hidrelay::scan(&backend)?;
    if as_json {
        let unreachable: Vec<_> = report
            .unreachable
            .iter()
            .map(|u| json!({ "device": u.descriptor, "error": u.error.to_string() }))
            .collect();
        let out = json!({ "usable": report.usable, "unreachable": unreachable });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Usable relay boards: {}", report.usable.len());
    for relay in &report.usable {
        println!("  {}", describe(relay));
    }
    if !report.unreachable.is_empty() {
        println!("Unreachable: {}", report.unreachable.len());
        for u in &report.unreachable {
            println!("  {} ({})", describe(&u.descriptor), u.error);
        }
    }
    Ok(())
}

/// Print the state of all channels
pub fn status(device: Option<&str>, config: RelayConfig, as_json: bool) -> CommandResult {
    with_relay(device, config, |relay| {
        let status = relay.get_all()?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Relay {}:", relay.descriptor().path());
            for (channel, state) in status.iter() {
                println!("  Channel {channel}: {state}");
            }
        }
        Ok(())
    })
}

/// Print the board serial number
pub fn serial(device: Option<&str>, config: RelayConfig) -> CommandResult {
    with_relay(device, config, |relay| {
        let sn = relay.get_serial()?;
        println!("{sn}");
        Ok(())
    })
}
