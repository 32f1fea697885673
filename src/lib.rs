//! Driver for USB-HID relay boards (VID 0x16C0, PID 0x05DF)
//!
//! Boards with one to eight relay channels are controlled through 9-byte
//! HID feature reports. This crate enumerates attached boards, opens a
//! session, and encodes the channel and serial number commands on top of
//! any [`HidBackend`].
//!
//! ```no_run
//! use hidrelay::{list, ChannelNumber, HidApiBackend};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HidApiBackend::new()?;
//! for descriptor in list(&backend) {
//!     let mut relay = descriptor.open(&backend)?;
//!     relay.set_on(ChannelNumber::C1)?;
//!     println!("{:?}", relay.get_all()?.channels());
//!     relay.close()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod relay;

pub use command::{ChannelNumber, ChannelStatus, IoStatus, SerialNumber};
pub use error::RelayError;
pub use protocol::ReportLayout;
pub use relay::{
    list, scan, HidRelay, RelayConfig, RelayDescriptor, RelayHandle, ScanReport, UnreachableRelay,
};

// Re-export the transport surface so consumers need a single dependency
pub use hidrelay_transport::{
    FeatureDevice, HidApiBackend, HidBackend, TransportDeviceInfo, TransportError,
};
