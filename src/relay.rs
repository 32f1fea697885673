//! Relay enumeration and the open/close lifecycle

use hidrelay_transport::{
    FeatureDevice, HidApiDevice, HidBackend, TransportDeviceInfo, TransportError,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::{
    ChannelNumber, ChannelStatus, FeatureQuery, HidCommand, HidResponse, IoStatus, SerialNumber,
    SetChannel, WriteSerial,
};
use crate::error::RelayError;
use crate::protocol::{cmd, device, normalize_response, ReportLayout};

/// Relay handle over the system hidapi backend
pub type HidRelay = RelayHandle<HidApiDevice>;

/// Per-handle settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayConfig {
    /// Response framing; defaults to the build platform's
    pub report_layout: ReportLayout,
}

/// A relay board found by enumeration, not yet opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayDescriptor {
    info: TransportDeviceInfo,
}

impl RelayDescriptor {
    pub fn new(info: TransportDeviceInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    /// Platform HID path of the device
    pub fn path(&self) -> &str {
        &self.info.device_path
    }

    /// Open a session with the platform's report layout
    pub fn open<B: HidBackend>(&self, backend: &B) -> Result<RelayHandle<B::Device>, RelayError> {
        RelayHandle::open(backend, self)
    }

    /// Open a session with explicit settings
    pub fn open_with<B: HidBackend>(
        &self,
        backend: &B,
        config: RelayConfig,
    ) -> Result<RelayHandle<B::Device>, RelayError> {
        RelayHandle::open_with(backend, self, config)
    }
}

/// An open relay board
///
/// Owns the transport device exclusively. `close` consumes the handle, so
/// no operation can run on a closed device. Dropping the handle also
/// releases the device, but only `close` reports a failure to do so.
pub struct RelayHandle<D: FeatureDevice> {
    descriptor: RelayDescriptor,
    device: D,
    layout: ReportLayout,
}

impl<D: FeatureDevice> RelayHandle<D> {
    /// Open `descriptor` with the platform's report layout
    pub fn open<B>(backend: &B, descriptor: &RelayDescriptor) -> Result<Self, RelayError>
    where
        B: HidBackend<Device = D>,
    {
        Self::open_with(backend, descriptor, RelayConfig::default())
    }

    /// Open `descriptor` with explicit settings
    pub fn open_with<B>(
        backend: &B,
        descriptor: &RelayDescriptor,
        config: RelayConfig,
    ) -> Result<Self, RelayError>
    where
        B: HidBackend<Device = D>,
    {
        let device = backend.open(descriptor.info())?;
        info!(
            "Opened relay {} (layout={})",
            descriptor.path(),
            config.report_layout
        );
        Ok(Self {
            descriptor: descriptor.clone(),
            device,
            layout: config.report_layout,
        })
    }

    pub fn descriptor(&self) -> &RelayDescriptor {
        &self.descriptor
    }

    pub fn report_layout(&self) -> ReportLayout {
        self.layout
    }

    /// Release the transport session
    pub fn close(self) -> Result<(), RelayError> {
        info!("Closing relay {}", self.descriptor.path());
        self.device.close()?;
        Ok(())
    }

    // === Channel Control ===

    /// Switch `channel` to `status`
    ///
    /// Fire-and-forget: the device does not acknowledge, and no read-back is
    /// done. A failed call leaves the channel state unknown.
    pub fn set(&mut self, channel: ChannelNumber, status: IoStatus) -> Result<(), RelayError> {
        self.send(&SetChannel::new(channel, status))
    }

    /// Switch the channel with integer number `n` (0 = all, 1-8)
    ///
    /// Fails with `InvalidChannel` before touching the device when `n` is
    /// out of range.
    pub fn set_channel_number(&mut self, n: i64, status: IoStatus) -> Result<(), RelayError> {
        let channel = ChannelNumber::try_from(n)?;
        self.set(channel, status)
    }

    pub fn set_on(&mut self, channel: ChannelNumber) -> Result<(), RelayError> {
        self.set(channel, IoStatus::On)
    }

    pub fn set_off(&mut self, channel: ChannelNumber) -> Result<(), RelayError> {
        self.set(channel, IoStatus::Off)
    }

    pub fn set_all_on(&mut self) -> Result<(), RelayError> {
        self.set(ChannelNumber::All, IoStatus::On)
    }

    pub fn set_all_off(&mut self) -> Result<(), RelayError> {
        self.set(ChannelNumber::All, IoStatus::Off)
    }

    /// Read the state of all eight channels
    pub fn get_all(&mut self) -> Result<ChannelStatus, RelayError> {
        self.read()
    }

    // === Serial Number ===

    /// Write the device serial (at most 5 bytes)
    pub fn set_serial(&mut self, serial: &str) -> Result<(), RelayError> {
        let command = WriteSerial::new(serial)?;
        self.send(&command)
    }

    /// Read the device serial
    pub fn get_serial(&mut self) -> Result<SerialNumber, RelayError> {
        self.read()
    }

    fn send<C: HidCommand>(&mut self, command: &C) -> Result<(), RelayError> {
        let buf = command.build();
        debug!("Sending {}: {:02X?}", cmd::name(buf[1]), buf);
        self.device.send_feature_report(&buf)?;
        Ok(())
    }

    fn read<R: HidResponse>(&mut self) -> Result<R, RelayError> {
        let mut buf = FeatureQuery.build();
        let len = self.device.get_feature_report(&mut buf)?.min(buf.len());
        let raw = &buf[..len];
        debug!("Got feature report ({} bytes): {:02X?}", len, raw);
        R::parse(normalize_response(raw, self.layout))
    }
}

/// A matching device that could not be opened during a scan
#[derive(Debug)]
pub struct UnreachableRelay {
    pub descriptor: RelayDescriptor,
    pub error: TransportError,
}

/// Result of probing every matching device
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Devices that opened; a failed probe close is only logged
    pub usable: Vec<RelayDescriptor>,
    /// Devices that matched VID/PID but failed to open
    pub unreachable: Vec<UnreachableRelay>,
}

/// Enumerate relay boards and probe each one with an open/close cycle
///
/// Fails only when the enumeration itself fails. Probe failures land in
/// [`ScanReport::unreachable`].
pub fn scan<B: HidBackend>(backend: &B) -> Result<ScanReport, RelayError> {
    let infos = backend.enumerate(device::VENDOR_ID, device::PRODUCT_ID)?;
    let mut report = ScanReport::default();

    for info in infos {
        let descriptor = RelayDescriptor::new(info);
        match backend.open(descriptor.info()) {
            Ok(probe) => {
                if let Err(e) = probe.close() {
                    debug!("Probe close failed for {}: {}", descriptor.path(), e);
                }
                debug!("Found relay {}", descriptor.path());
                report.usable.push(descriptor);
            }
            Err(error) => {
                debug!("Skipping relay {}: {}", descriptor.path(), error);
                report.unreachable.push(UnreachableRelay { descriptor, error });
            }
        }
    }

    info!(
        "Found {} relay(s), {} unreachable",
        report.usable.len(),
        report.unreachable.len()
    );
    Ok(report)
}

/// List relay boards that are present and can be opened
///
/// Devices that fail to open are left out. Never fails: an enumeration
/// error is logged and yields an empty list. Use [`scan`] for diagnostics.
pub fn list<B: HidBackend>(backend: &B) -> Vec<RelayDescriptor> {
    match scan(backend) {
        Ok(report) => report.usable,
        Err(e) => {
            warn!("Relay enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hidrelay_transport::mock::{mock_device_info, MockBackend};

    fn relay_backend(path: &str) -> (MockBackend, RelayDescriptor) {
        let backend = MockBackend::new();
        let info = mock_device_info(device::VENDOR_ID, device::PRODUCT_ID, path);
        backend.add_device(info.clone());
        (backend, RelayDescriptor::new(info))
    }

    #[test]
    fn test_get_all_strips_leading_report_id() {
        let (backend, desc) = relay_backend("relay-0");
        backend.set_response("relay-0", &[0x00, 0, 0, 0, 0, 0, 0, 0, 0b1000_0001]);

        let config = RelayConfig {
            report_layout: ReportLayout::LeadingReportId,
        };
        let mut relay = desc.open_with(&backend, config).unwrap();
        let status = relay.get_all().unwrap();
        assert_eq!(status.bitmap(), 0b1000_0001);
        relay.close().unwrap();
    }

    #[test]
    fn test_get_all_bare_layout() {
        let (backend, desc) = relay_backend("relay-0");
        backend.set_response("relay-0", &[0, 0, 0, 0, 0, 0, 0, 0b0000_0110, 0]);

        let config = RelayConfig {
            report_layout: ReportLayout::Bare,
        };
        let mut relay = desc.open_with(&backend, config).unwrap();
        let status = relay.get_all().unwrap();
        assert_eq!(status.get(ChannelNumber::C2), Some(IoStatus::On));
        assert_eq!(status.get(ChannelNumber::C3), Some(IoStatus::On));
        assert_eq!(status.get(ChannelNumber::C1), Some(IoStatus::Off));
    }

    #[test]
    fn test_reads_use_zeroed_query_and_send_nothing() {
        let (backend, desc) = relay_backend("relay-0");
        backend.set_response("relay-0", &[0u8; 9]);
        let mut relay = desc.open(&backend).unwrap();

        relay.get_all().unwrap();
        relay.get_serial().unwrap();

        assert_eq!(backend.read_count(), 2);
        assert!(backend.sent_reports().is_empty());
    }

    #[test]
    fn test_short_read_is_rejected() {
        let (backend, desc) = relay_backend("relay-0");
        backend.set_response("relay-0", &[0, 0, 0xFF]);

        let config = RelayConfig {
            report_layout: ReportLayout::Bare,
        };
        let mut relay = desc.open_with(&backend, config).unwrap();
        assert!(matches!(
            relay.get_all(),
            Err(RelayError::ShortResponse {
                expected: 8,
                actual: 3
            })
        ));
        assert!(matches!(
            relay.get_serial(),
            Err(RelayError::ShortResponse {
                expected: 5,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_empty_read_is_rejected() {
        let (backend, desc) = relay_backend("relay-0");
        let config = RelayConfig {
            report_layout: ReportLayout::LeadingReportId,
        };
        let mut relay = desc.open_with(&backend, config).unwrap();

        assert!(matches!(
            relay.get_all(),
            Err(RelayError::ShortResponse { actual: 0, .. })
        ));
    }

    #[test]
    fn test_close_releases_device_once() {
        let (backend, desc) = relay_backend("relay-0");
        let relay = desc.open(&backend).unwrap();
        assert_eq!(relay.descriptor().path(), "relay-0");
        assert_eq!(relay.report_layout(), ReportLayout::native());

        relay.close().unwrap();
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.close_count(), 1);
    }
}
