//! In-memory HID backend for tests
//!
//! Records every feature report sent, serves a canned response to every
//! feature report read, and can be told to fail any transport call.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::types::TransportDeviceInfo;
use crate::{FeatureDevice, HidBackend};

/// A feature report written to a mock device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReport {
    pub device_path: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct MockDeviceSpec {
    info: TransportDeviceInfo,
    open_fails: bool,
    send_fails: bool,
    read_fails: bool,
    close_fails: bool,
    response: Vec<u8>,
}

impl MockDeviceSpec {
    fn new(info: TransportDeviceInfo, open_fails: bool) -> Self {
        Self {
            info,
            open_fails,
            send_fails: false,
            read_fails: false,
            close_fails: false,
            response: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<MockDeviceSpec>,
    enumerate_error: Option<String>,
    sent: Vec<SentReport>,
    reads: usize,
    opened: usize,
    closed: usize,
}

impl MockState {
    fn device(&self, path: &str) -> Option<&MockDeviceSpec> {
        self.devices.iter().find(|d| d.info.device_path == path)
    }

    fn device_mut(&mut self, path: &str) -> Option<&mut MockDeviceSpec> {
        self.devices.iter_mut().find(|d| d.info.device_path == path)
    }
}

/// Build device info for a mock device
pub fn mock_device_info(vid: u16, pid: u16, path: &str) -> TransportDeviceInfo {
    TransportDeviceInfo {
        vid,
        pid,
        device_path: path.to_string(),
        raw_path: None,
        serial: None,
        manufacturer: Some("mock".to_string()),
        product_name: Some("mock relay".to_string()),
    }
}

/// Cloneable handle to a shared in-memory device table
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device that opens and accepts reports
    pub fn add_device(&self, info: TransportDeviceInfo) {
        self.state.lock().devices.push(MockDeviceSpec::new(info, false));
    }

    /// Register a device that enumerates but refuses to open
    pub fn add_unreachable_device(&self, info: TransportDeviceInfo) {
        self.state.lock().devices.push(MockDeviceSpec::new(info, true));
    }

    /// Set the bytes returned by feature report reads on `path`
    pub fn set_response(&self, path: &str, response: &[u8]) {
        if let Some(dev) = self.state.lock().device_mut(path) {
            dev.response = response.to_vec();
        }
    }

    /// Make every feature report write on `path` fail
    pub fn fail_sends(&self, path: &str) {
        if let Some(dev) = self.state.lock().device_mut(path) {
            dev.send_fails = true;
        }
    }

    /// Make every feature report read on `path` fail
    pub fn fail_reads(&self, path: &str) {
        if let Some(dev) = self.state.lock().device_mut(path) {
            dev.read_fails = true;
        }
    }

    /// Make closing an open handle to `path` fail
    pub fn fail_closes(&self, path: &str) {
        if let Some(dev) = self.state.lock().device_mut(path) {
            dev.close_fails = true;
        }
    }

    /// Make enumeration itself fail
    pub fn fail_enumeration(&self, message: &str) {
        self.state.lock().enumerate_error = Some(message.to_string());
    }

    /// All feature reports written so far, across devices
    pub fn sent_reports(&self) -> Vec<SentReport> {
        self.state.lock().sent.clone()
    }

    /// Number of feature report reads served
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state.lock().opened
    }

    /// Number of close calls, failed ones included
    pub fn close_count(&self) -> usize {
        self.state.lock().closed
    }
}

impl HidBackend for MockBackend {
    type Device = MockDevice;

    fn enumerate(&self, vid: u16, pid: u16) -> Result<Vec<TransportDeviceInfo>, TransportError> {
        let state = self.state.lock();
        if let Some(ref msg) = state.enumerate_error {
            return Err(TransportError::HidError(msg.clone()));
        }
        Ok(state
            .devices
            .iter()
            .filter(|d| d.info.matches(vid, pid))
            .map(|d| d.info.clone())
            .collect())
    }

    fn open(&self, info: &TransportDeviceInfo) -> Result<MockDevice, TransportError> {
        let mut state = self.state.lock();
        let spec = state
            .device(&info.device_path)
            .ok_or_else(|| TransportError::DeviceNotFound(info.device_path.clone()))?;
        if spec.open_fails {
            return Err(TransportError::HidPermissionDenied(info.device_path.clone()));
        }
        state.opened += 1;
        Ok(MockDevice {
            state: Arc::clone(&self.state),
            path: info.device_path.clone(),
        })
    }
}

/// An open mock device
#[derive(Debug)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
    path: String,
}

impl FeatureDevice for MockDevice {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let spec = state.device(&self.path).ok_or(TransportError::Disconnected)?;
        if spec.send_fails {
            return Err(TransportError::HidError(format!(
                "send_feature_report failed on {}",
                self.path
            )));
        }
        state.sent.push(SentReport {
            device_path: self.path.clone(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        let spec = state.device(&self.path).ok_or(TransportError::Disconnected)?;
        if spec.read_fails {
            return Err(TransportError::HidError(format!(
                "get_feature_report failed on {}",
                self.path
            )));
        }
        let len = spec.response.len().min(buf.len());
        buf[..len].copy_from_slice(&spec.response[..len]);
        state.reads += 1;
        Ok(len)
    }

    fn close(self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.closed += 1;
        let fails = state.device(&self.path).is_some_and(|d| d.close_fails);
        if fails {
            return Err(TransportError::HidError(format!(
                "close failed on {}",
                self.path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_filters_by_vid_pid() {
        let backend = MockBackend::new();
        backend.add_device(mock_device_info(0x1234, 0x0001, "a"));
        backend.add_device(mock_device_info(0x1234, 0x0002, "b"));

        let found = backend.enumerate(0x1234, 0x0002).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].device_path, "b");
    }

    #[test]
    fn test_unreachable_device_fails_open() {
        let backend = MockBackend::new();
        let info = mock_device_info(0x1234, 0x0001, "a");
        backend.add_unreachable_device(info.clone());

        assert!(backend.open(&info).is_err());
        assert_eq!(backend.open_count(), 0);
    }

    #[test]
    fn test_device_records_sends_and_serves_reads() {
        let backend = MockBackend::new();
        let info = mock_device_info(0x1234, 0x0001, "a");
        backend.add_device(info.clone());
        backend.set_response("a", &[1, 2, 3]);

        let mut dev = backend.open(&info).unwrap();
        dev.send_feature_report(&[0, 0xFF, 1]).unwrap();

        let mut buf = [0u8; 9];
        assert_eq!(dev.get_feature_report(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..4], &[1, 2, 3, 0]);

        dev.close().unwrap();
        assert_eq!(backend.sent_reports()[0].data, vec![0, 0xFF, 1]);
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_injected_read_and_close_failures() {
        let backend = MockBackend::new();
        let info = mock_device_info(0x1234, 0x0001, "a");
        backend.add_device(info.clone());
        backend.fail_reads("a");
        backend.fail_closes("a");

        let mut dev = backend.open(&info).unwrap();
        let mut buf = [0u8; 9];
        assert!(matches!(
            dev.get_feature_report(&mut buf),
            Err(TransportError::HidError(_))
        ));
        assert_eq!(backend.read_count(), 0);

        assert!(matches!(dev.close(), Err(TransportError::HidError(_))));
        assert_eq!(backend.close_count(), 1);
    }
}
