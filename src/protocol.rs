//! Protocol constants and utilities for USB-HID relay board communication

use std::fmt;
use std::str::FromStr;

/// Feature report command bytes (byte[1] of every report)
pub mod cmd {
    /// Switch one channel on (channel number in byte[2])
    pub const CHANNEL_ON: u8 = 0xFF;
    /// Switch one channel off (channel number in byte[2])
    pub const CHANNEL_OFF: u8 = 0xFD;
    /// Switch every channel on
    pub const ALL_ON: u8 = 0xFE;
    /// Switch every channel off
    pub const ALL_OFF: u8 = 0xFC;
    /// Write serial number (serial bytes from byte[2])
    pub const SET_SERIAL: u8 = 0xFA;

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            CHANNEL_ON => "CHANNEL_ON",
            CHANNEL_OFF => "CHANNEL_OFF",
            ALL_ON => "ALL_ON",
            ALL_OFF => "ALL_OFF",
            SET_SERIAL => "SET_SERIAL",
            0x00 => "QUERY",
            _ => "UNKNOWN",
        }
    }
}

/// Device identification constants
pub mod device {
    /// Relay board vendor ID (V-USB shared VID)
    pub const VENDOR_ID: u16 = 0x16C0;
    /// Relay board product ID (V-USB shared HID PID)
    pub const PRODUCT_ID: u16 = 0x05DF;
}

/// Feature report size, report ID included
pub const REPORT_SIZE: usize = 9;

/// Report ID used for every command and query
pub const REPORT_ID: u8 = 0x00;

/// Number of relay channels on the largest board
pub const CHANNEL_COUNT: usize = 8;

/// Maximum serial number length in bytes
pub const SERIAL_LEN: usize = 5;

/// Offset of the channel bitmap in a normalized status payload
pub const STATUS_BITMAP_OFFSET: usize = 7;

/// Framing of feature report responses on the host platform
///
/// Windows hands back the report ID in front of the payload; the other
/// hidapi backends return the payload alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLayout {
    /// Response starts with the report ID byte
    LeadingReportId,
    /// Response starts directly with the payload
    Bare,
}

impl ReportLayout {
    /// Layout of the platform this binary was built for
    pub const fn native() -> Self {
        if cfg!(windows) {
            ReportLayout::LeadingReportId
        } else {
            ReportLayout::Bare
        }
    }

    /// Number of framing bytes before the payload
    pub const fn payload_offset(self) -> usize {
        match self {
            ReportLayout::LeadingReportId => 1,
            ReportLayout::Bare => 0,
        }
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLayout::LeadingReportId => f.write_str("leading-id"),
            ReportLayout::Bare => f.write_str("bare"),
        }
    }
}

impl FromStr for ReportLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "native" => Ok(ReportLayout::native()),
            "leading-id" | "leading" | "windows" => Ok(ReportLayout::LeadingReportId),
            "bare" | "none" => Ok(ReportLayout::Bare),
            _ => Err(format!(
                "unknown report layout: \"{s}\". Use auto, leading-id or bare"
            )),
        }
    }
}

/// Strip platform framing from a raw feature report response
///
/// After normalization the payload offsets are the same on every platform.
pub fn normalize_response(raw: &[u8], layout: ReportLayout) -> &[u8] {
    raw.get(layout.payload_offset()..).unwrap_or(&[])
}

/// Build an empty report buffer (report ID set, everything else zero)
pub fn empty_report() -> [u8; REPORT_SIZE] {
    let mut buf = [0u8; REPORT_SIZE];
    buf[0] = REPORT_ID;
    buf
}
