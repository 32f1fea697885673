//! Transport abstraction layer for USB-HID relay boards
//!
//! This crate provides the narrow HID surface the relay driver needs:
//!
//! - device enumeration by vendor/product ID
//! - opening a device handle
//! - synchronous feature report writes and reads
//! - closing the handle
//!
//! The hidapi backend talks to real hardware. The `mock` feature adds an
//! in-memory backend so higher layers can be tested without a board attached.

pub mod error;
pub mod types;

mod hid_api;

#[cfg(feature = "mock")]
pub mod mock;

pub use error::TransportError;
pub use hid_api::{HidApiBackend, HidApiDevice};
pub use types::TransportDeviceInfo;

/// An open HID device that exchanges feature reports
///
/// All calls block until the underlying transport returns. Implementations
/// are not expected to be shared between threads; callers serialize access.
pub trait FeatureDevice {
    /// Write a feature report
    ///
    /// # Arguments
    /// * `data` - Full report including the report ID at `data[0]`
    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read a feature report into `buf`
    ///
    /// `buf[0]` must hold the report ID to request. Returns the number of
    /// bytes the transport wrote into `buf`.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the device handle
    fn close(self) -> Result<(), TransportError>;
}

/// Device enumeration and open
pub trait HidBackend {
    /// Device type produced by [`HidBackend::open`]
    type Device: FeatureDevice;

    /// List devices matching a VID/PID pair
    fn enumerate(&self, vid: u16, pid: u16) -> Result<Vec<TransportDeviceInfo>, TransportError>;

    /// Open a previously enumerated device
    fn open(&self, info: &TransportDeviceInfo) -> Result<Self::Device, TransportError>;
}
