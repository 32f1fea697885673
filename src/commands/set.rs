//! Set command handlers.

use super::{with_relay, CommandResult};
use hidrelay::{ChannelNumber, IoStatus, RelayConfig};

/// Switch a channel (or all channels)
pub fn switch(
    device: Option<&str>,
    config: RelayConfig,
    channel: ChannelNumber,
    state: IoStatus,
) -> CommandResult {
    with_relay(device, config, |relay| {
        relay.set(channel, state)?;
        println!("Channel {channel} -> {state}");
        Ok(())
    })
}

/// Write the board serial number
pub fn set_serial(device: Option<&str>, config: RelayConfig, serial: &str) -> CommandResult {
    with_relay(device, config, |relay| {
        relay.set_serial(serial)?;
        println!("Serial number set to {serial}");
        Ok(())
    })
}
