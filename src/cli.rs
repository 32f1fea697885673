// CLI definitions using clap

use clap::{Parser, Subcommand};
use hidrelay::{ChannelNumber, ReportLayout};

#[derive(Parser)]
#[command(name = "hidrelay")]
#[command(author, version, about = "USB-HID relay board control")]
#[command(propagate_version = true)]
pub struct Cli {
    /// HID path of the relay to use (default: first usable relay)
    #[arg(long, global = true, value_name = "PATH")]
    pub device: Option<String>,

    /// Response framing (auto, leading-id, bare)
    #[arg(long, global = true, default_value = "auto")]
    pub report_layout: ReportLayout,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List attached relay boards
    #[command(visible_alias = "ls")]
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Also show boards that matched but could not be opened
        #[arg(short, long)]
        all: bool,
    },

    /// Switch a channel on (1-8 or "all")
    On {
        channel: ChannelNumber,
    },

    /// Switch a channel off (1-8 or "all")
    Off {
        channel: ChannelNumber,
    },

    /// Show the state of all channels
    #[command(visible_aliases = ["st", "get"])]
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read the board serial number
    #[command(visible_alias = "sn")]
    Serial,

    /// Write the board serial number (at most 5 characters)
    SetSerial {
        serial: String,
    },
}
