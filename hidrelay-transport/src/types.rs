//! Common types for transport layer

use std::ffi::CString;

use serde::Serialize;

use crate::error::TransportError;

/// Device identification information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Platform HID path for display and lookup (lossy if not UTF-8)
    pub device_path: String,
    /// Exact path bytes reported by hidapi, used to reopen the device
    #[serde(skip)]
    pub raw_path: Option<CString>,
    /// USB serial string if the descriptor carries one
    pub serial: Option<String>,
    /// Manufacturer name if available
    pub manufacturer: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

impl TransportDeviceInfo {
    /// Build from a hidapi enumeration entry
    pub fn from_hidapi(info: &hidapi::DeviceInfo) -> Self {
        Self {
            vid: info.vendor_id(),
            pid: info.product_id(),
            device_path: info.path().to_string_lossy().to_string(),
            raw_path: Some(info.path().to_owned()),
            serial: info.serial_number().map(|s| s.to_string()),
            manufacturer: info.manufacturer_string().map(|s| s.to_string()),
            product_name: info.product_string().map(|s| s.to_string()),
        }
    }

    /// Check if this entry has the given VID/PID pair
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vid == vid && self.pid == pid
    }

    /// Path to hand back to hidapi when opening
    ///
    /// Prefers the raw enumeration path so non-UTF-8 paths survive the
    /// round trip; falls back to `device_path` for hand-built entries.
    pub fn hid_path(&self) -> Result<CString, TransportError> {
        if let Some(raw) = &self.raw_path {
            return Ok(raw.clone());
        }
        CString::new(self.device_path.as_str()).map_err(|_| {
            TransportError::Internal(format!("HID path contains NUL: {}", self.device_path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(device_path: &str, raw_path: Option<CString>) -> TransportDeviceInfo {
        TransportDeviceInfo {
            vid: 0x16C0,
            pid: 0x05DF,
            device_path: device_path.to_string(),
            raw_path,
            serial: None,
            manufacturer: None,
            product_name: None,
        }
    }

    #[test]
    fn test_hid_path_keeps_non_utf8_bytes() {
        let raw = CString::new(vec![b'/', b'd', 0xFF, b'x']).unwrap();
        let lossy = raw.to_string_lossy().to_string();
        let entry = info(&lossy, Some(raw.clone()));

        assert_ne!(entry.hid_path().unwrap(), CString::new(lossy).unwrap());
        assert_eq!(entry.hid_path().unwrap(), raw);
    }

    #[test]
    fn test_hid_path_falls_back_to_display_path() {
        let entry = info("/dev/hidraw3", None);
        assert_eq!(entry.hid_path().unwrap().as_bytes(), b"/dev/hidraw3");

        let bad = info("a\0b", None);
        assert!(matches!(bad.hid_path(), Err(TransportError::Internal(_))));
    }

    #[test]
    fn test_matches() {
        let entry = info("p", None);
        assert!(entry.matches(0x16C0, 0x05DF));
        assert!(!entry.matches(0x16C0, 0x0001));
    }
}
