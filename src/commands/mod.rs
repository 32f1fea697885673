//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (list, status, serial)
//! - `set`: commands that change board state (on, off, set-serial)

pub mod query;
pub mod set;

use hidrelay::{HidApiBackend, HidRelay, RelayConfig, RelayDescriptor};

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Pick the relay at `device`, or the first usable one
fn select_relay(
    backend: &HidApiBackend,
    device: Option<&str>,
) -> Result<RelayDescriptor, Box<dyn std::error::Error>> {
    let relays = hidrelay::list(backend);
    let chosen = match device {
        Some(path) => relays.into_iter().find(|r| r.path() == path),
        None => relays.into_iter().next(),
    };
    chosen.ok_or_else(|| {
        let msg = match device {
            Some(path) => format!("No usable relay board at {path}"),
            None => "No usable relay board found".to_string(),
        };
        msg.into()
    })
}

/// Open a relay and run a closure with it.
/// The relay is closed afterwards even if the closure fails.
pub fn with_relay<F>(device: Option<&str>, config: RelayConfig, f: F) -> CommandResult
where
    F: FnOnce(&mut HidRelay) -> CommandResult,
{
    let backend = HidApiBackend::new()?;
    let descriptor = select_relay(&backend, device)?;
    let mut relay = descriptor.open_with(&backend, config)?;

    let result = f(&mut relay);
    let closed = relay.close();
    result?;
    closed?;
    Ok(())
}
