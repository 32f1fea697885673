//! hidapi-backed transport for USB relay boards

use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::types::TransportDeviceInfo;
use crate::{FeatureDevice, HidBackend};

/// HID backend over the system hidapi library
///
/// Holds one `HidApi` context for the lifetime of the backend. Each call to
/// [`HidBackend::enumerate`] refreshes the device list first, so devices
/// plugged in after construction are picked up.
pub struct HidApiBackend {
    api: Mutex<HidApi>,
}

impl HidApiBackend {
    /// Initialize the hidapi context
    pub fn new() -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl HidBackend for HidApiBackend {
    type Device = HidApiDevice;

    fn enumerate(&self, vid: u16, pid: u16) -> Result<Vec<TransportDeviceInfo>, TransportError> {
        let mut api = self.api.lock();
        api.refresh_devices()?;

        let devices: Vec<TransportDeviceInfo> = api
            .device_list()
            .map(TransportDeviceInfo::from_hidapi)
            .filter(|d| d.matches(vid, pid))
            .collect();

        debug!(
            "Enumerated {} HID device(s) for {:04X}:{:04X}",
            devices.len(),
            vid,
            pid
        );
        Ok(devices)
    }

    fn open(&self, info: &TransportDeviceInfo) -> Result<HidApiDevice, TransportError> {
        let path = info.hid_path()?;
        let device = self.api.lock().open_path(&path)?;
        debug!("Opened HID device {}", info.device_path);
        Ok(HidApiDevice {
            device,
            path: info.device_path.clone(),
        })
    }
}

/// An open hidapi device handle
///
/// The underlying handle is released when this value is dropped.
pub struct HidApiDevice {
    device: HidDevice,
    path: String,
}

impl FeatureDevice for HidApiDevice {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.device.send_feature_report(data)?;
        Ok(())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(self.device.get_feature_report(buf)?)
    }

    fn close(self) -> Result<(), TransportError> {
        // hidapi closes the handle on drop and has no fallible close
        debug!("Closing HID device {}", self.path);
        drop(self.device);
        Ok(())
    }
}
