//! Type-safe relay command builders and response parsers
//!
//! Every exchange with the board is a single 9-byte feature report. This
//! module owns the byte layout of those reports so the relay handle only
//! moves buffers between the codec and the transport.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::RelayError;
use crate::protocol::{self, cmd, CHANNEL_COUNT, REPORT_SIZE, SERIAL_LEN, STATUS_BITMAP_OFFSET};

// =============================================================================
// Core Traits
// =============================================================================

/// A command that can be serialized to a feature report
pub trait HidCommand {
    /// Serialize to bytes (excluding report ID)
    fn to_data(&self) -> Vec<u8>;

    /// Build the complete report buffer (report ID, data, zero padding)
    fn build(&self) -> [u8; REPORT_SIZE] {
        let mut buf = protocol::empty_report();
        let data = self.to_data();
        let len = data.len().min(REPORT_SIZE - 1);
        buf[1..1 + len].copy_from_slice(&data[..len]);
        buf
    }
}

/// A response that can be parsed from a normalized feature report payload
pub trait HidResponse: Sized {
    /// Minimum payload length required
    const MIN_LEN: usize;

    /// Parse from a payload already checked against `MIN_LEN`
    fn from_payload(payload: &[u8]) -> Self;

    /// Parse from a normalized payload (platform framing already stripped)
    fn parse(payload: &[u8]) -> Result<Self, RelayError> {
        if payload.len() < Self::MIN_LEN {
            return Err(RelayError::ShortResponse {
                expected: Self::MIN_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self::from_payload(payload))
    }
}

// =============================================================================
// Channel and status values
// =============================================================================

/// Relay channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChannelNumber {
    /// Every channel at once
    All = 0,
    C1 = 1,
    C2 = 2,
    C3 = 3,
    C4 = 4,
    C5 = 5,
    C6 = 6,
    C7 = 7,
    C8 = 8,
}

impl ChannelNumber {
    /// The eight discrete channels in order
    pub const CHANNELS: [ChannelNumber; CHANNEL_COUNT] = [
        ChannelNumber::C1,
        ChannelNumber::C2,
        ChannelNumber::C3,
        ChannelNumber::C4,
        ChannelNumber::C5,
        ChannelNumber::C6,
        ChannelNumber::C7,
        ChannelNumber::C8,
    ];

    /// Wire value (0 for ALL, 1-8 otherwise)
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn is_all(self) -> bool {
        self == ChannelNumber::All
    }

    /// Bit position in the status bitmap, `None` for ALL
    pub fn bit(self) -> Option<u8> {
        match self {
            ChannelNumber::All => None,
            ch => Some(ch.number() - 1),
        }
    }
}

impl TryFrom<i64> for ChannelNumber {
    type Error = RelayError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        match n {
            0 => Ok(ChannelNumber::All),
            1..=8 => Ok(ChannelNumber::CHANNELS[(n - 1) as usize]),
            _ => Err(RelayError::InvalidChannel(n)),
        }
    }
}

impl TryFrom<u8> for ChannelNumber {
    type Error = RelayError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        ChannelNumber::try_from(i64::from(n))
    }
}

impl fmt::Display for ChannelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelNumber::All => f.write_str("all"),
            ch => write!(f, "{}", ch.number()),
        }
    }
}

impl FromStr for ChannelNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(ChannelNumber::All);
        }
        let n: i64 = s
            .parse()
            .map_err(|_| format!("unknown channel: \"{s}\". Use all or 1-8"))?;
        ChannelNumber::try_from(n).map_err(|e| e.to_string())
    }
}

/// On/off state of a channel or a requested action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum IoStatus {
    #[default]
    Off = 0,
    On = 1,
}

impl IoStatus {
    pub fn is_on(self) -> bool {
        self == IoStatus::On
    }
}

impl From<bool> for IoStatus {
    fn from(on: bool) -> Self {
        if on {
            IoStatus::On
        } else {
            IoStatus::Off
        }
    }
}

impl fmt::Display for IoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoStatus::Off => f.write_str("OFF"),
            IoStatus::On => f.write_str("ON"),
        }
    }
}

impl FromStr for IoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(IoStatus::On),
            "off" | "0" | "false" => Ok(IoStatus::Off),
            _ => Err(format!("unknown state: \"{s}\". Use on or off")),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Switch one channel (or all of them) on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetChannel {
    pub channel: ChannelNumber,
    pub status: IoStatus,
}

impl SetChannel {
    pub fn new(channel: ChannelNumber, status: IoStatus) -> Self {
        Self { channel, status }
    }

    /// Command byte for this channel/status pair
    pub fn command_byte(&self) -> u8 {
        match (self.channel, self.status) {
            (ChannelNumber::All, IoStatus::On) => cmd::ALL_ON,
            (ChannelNumber::All, IoStatus::Off) => cmd::ALL_OFF,
            (_, IoStatus::On) => cmd::CHANNEL_ON,
            (_, IoStatus::Off) => cmd::CHANNEL_OFF,
        }
    }
}

impl HidCommand for SetChannel {
    fn to_data(&self) -> Vec<u8> {
        if self.channel.is_all() {
            vec![self.command_byte()]
        } else {
            vec![self.command_byte(), self.channel.number()]
        }
    }
}

/// Write the device serial number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSerial {
    serial: SerialNumber,
}

impl WriteSerial {
    /// Fails with `SerialTooLong` when `serial` exceeds 5 bytes
    pub fn new(serial: &str) -> Result<Self, RelayError> {
        Ok(Self {
            serial: SerialNumber::new(serial)?,
        })
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }
}

impl HidCommand for WriteSerial {
    fn to_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(1 + SERIAL_LEN);
        data.push(cmd::SET_SERIAL);
        data.extend_from_slice(self.serial.as_bytes());
        data
    }
}

/// All-zero report used to read back status and serial
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureQuery;

impl HidCommand for FeatureQuery {
    fn to_data(&self) -> Vec<u8> {
        Vec::new()
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Snapshot of all eight channel states
///
/// Decoded from one status read; it does not follow later changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelStatus {
    bitmap: u8,
    channels: [IoStatus; CHANNEL_COUNT],
}

impl ChannelStatus {
    /// Decode a channel bitmap (bit k = channel k+1)
    pub fn from_bitmap(bitmap: u8) -> Self {
        let mut channels = [IoStatus::Off; CHANNEL_COUNT];
        for (i, slot) in channels.iter_mut().enumerate() {
            *slot = IoStatus::from((bitmap >> i) & 0x01 == 1);
        }
        Self { bitmap, channels }
    }

    /// Raw bitmap as reported by the device
    pub fn bitmap(&self) -> u8 {
        self.bitmap
    }

    /// State of one channel, `None` for ALL
    pub fn get(&self, channel: ChannelNumber) -> Option<IoStatus> {
        channel.bit().map(|bit| self.channels[bit as usize])
    }

    /// States of channels 1-8 in order
    pub fn channels(&self) -> [IoStatus; CHANNEL_COUNT] {
        self.channels
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelNumber, IoStatus)> + '_ {
        ChannelNumber::CHANNELS
            .iter()
            .copied()
            .zip(self.channels.iter().copied())
    }

    pub fn all_on(&self) -> bool {
        self.bitmap == 0xFF
    }

    pub fn all_off(&self) -> bool {
        self.bitmap == 0x00
    }
}

impl HidResponse for ChannelStatus {
    const MIN_LEN: usize = STATUS_BITMAP_OFFSET + 1;

    fn from_payload(payload: &[u8]) -> Self {
        Self::from_bitmap(payload[STATUS_BITMAP_OFFSET])
    }
}

/// Device serial number, at most 5 bytes
///
/// The device stores exactly five bytes. A shorter serial is padded with
/// zero bytes on write, and that padding comes back on read; `as_bytes` and
/// `Display` hide it, `as_raw_bytes` does not.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber {
    raw: [u8; SERIAL_LEN],
}

impl SerialNumber {
    /// Fails with `SerialTooLong` when `serial` exceeds 5 bytes
    pub fn new(serial: &str) -> Result<Self, RelayError> {
        let bytes = serial.as_bytes();
        if bytes.len() > SERIAL_LEN {
            return Err(RelayError::SerialTooLong { len: bytes.len() });
        }
        let mut raw = [0u8; SERIAL_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { raw })
    }

    /// Serial bytes without trailing zero padding
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .raw
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        &self.raw[..end]
    }

    /// All five stored bytes, padding included
    pub fn as_raw_bytes(&self) -> &[u8; SERIAL_LEN] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl HidResponse for SerialNumber {
    const MIN_LEN: usize = SERIAL_LEN;

    fn from_payload(payload: &[u8]) -> Self {
        let mut raw = [0u8; SERIAL_LEN];
        raw.copy_from_slice(&payload[..SERIAL_LEN]);
        Self { raw }
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({:?} {:02X?})", self.to_string(), self.raw)
    }
}

impl FromStr for SerialNumber {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SerialNumber::new(s)
    }
}

impl Serialize for SerialNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{normalize_response, ReportLayout};

    #[test]
    fn test_set_single_channel_encoding() {
        for n in 1..=8u8 {
            let ch = ChannelNumber::try_from(n).unwrap();

            let on = SetChannel::new(ch, IoStatus::On).build();
            assert_eq!(on[0], 0x00); // Report ID
            assert_eq!(on[1], 0xFF);
            assert_eq!(on[2], n);
            assert!(on[3..].iter().all(|&b| b == 0));

            let off = SetChannel::new(ch, IoStatus::Off).build();
            assert_eq!(off[1], 0xFD);
            assert_eq!(off[2], n);
        }
    }

    #[test]
    fn test_set_all_encoding() {
        let on = SetChannel::new(ChannelNumber::All, IoStatus::On).build();
        assert_eq!(on, [0x00, 0xFE, 0, 0, 0, 0, 0, 0, 0]);

        let off = SetChannel::new(ChannelNumber::All, IoStatus::Off).build();
        assert_eq!(off, [0x00, 0xFC, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_channel_number_range() {
        assert_eq!(ChannelNumber::try_from(0i64).unwrap(), ChannelNumber::All);
        assert_eq!(ChannelNumber::try_from(8i64).unwrap(), ChannelNumber::C8);
        for n in [-1i64, 9, 255, i64::MIN, i64::MAX] {
            assert!(matches!(
                ChannelNumber::try_from(n),
                Err(RelayError::InvalidChannel(v)) if v == n
            ));
        }
    }

    #[test]
    fn test_channel_number_parse() {
        assert_eq!("ALL".parse::<ChannelNumber>(), Ok(ChannelNumber::All));
        assert_eq!("3".parse::<ChannelNumber>(), Ok(ChannelNumber::C3));
        assert!("9".parse::<ChannelNumber>().is_err());
        assert!("x".parse::<ChannelNumber>().is_err());
    }

    #[test]
    fn test_io_status_parse() {
        assert_eq!("ON".parse::<IoStatus>(), Ok(IoStatus::On));
        assert_eq!("0".parse::<IoStatus>(), Ok(IoStatus::Off));
        assert!("maybe".parse::<IoStatus>().is_err());
        assert_eq!(IoStatus::from(true), IoStatus::On);
    }

    #[test]
    fn test_status_bitmap_decode() {
        let mut payload = [0u8; 8];
        payload[STATUS_BITMAP_OFFSET] = 0b1010_0001;

        let status = ChannelStatus::parse(&payload).unwrap();
        use IoStatus::{Off, On};
        assert_eq!(status.channels(), [On, Off, Off, Off, Off, On, Off, On]);
        assert_eq!(status.get(ChannelNumber::C1), Some(On));
        assert_eq!(status.get(ChannelNumber::C6), Some(On));
        assert_eq!(status.get(ChannelNumber::C8), Some(On));
        assert_eq!(status.get(ChannelNumber::All), None);
    }

    #[test]
    fn test_status_decode_is_lsb_first() {
        // bit k-1 controls channel k
        let status = ChannelStatus::from_bitmap(0b0000_0100);
        let on: Vec<_> = status
            .iter()
            .filter(|(_, s)| s.is_on())
            .map(|(ch, _)| ch)
            .collect();
        assert_eq!(on, vec![ChannelNumber::C3]);
        assert!(!status.all_on());
        assert!(!status.all_off());
        assert!(ChannelStatus::from_bitmap(0xFF).all_on());
        assert!(ChannelStatus::from_bitmap(0x00).all_off());
    }

    #[test]
    fn test_status_short_payload() {
        let err = ChannelStatus::parse(&[0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            RelayError::ShortResponse {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_status_round_trip_through_both_layouts() {
        let bitmap = 0b0101_1100;
        for layout in [ReportLayout::Bare, ReportLayout::LeadingReportId] {
            let mut raw = [0u8; REPORT_SIZE];
            raw[layout.payload_offset() + STATUS_BITMAP_OFFSET] = bitmap;
            let status = ChannelStatus::parse(normalize_response(&raw, layout)).unwrap();
            assert_eq!(status.bitmap(), bitmap);
        }
    }

    #[test]
    fn test_write_serial_encoding() {
        let buf = WriteSerial::new("AB12C").unwrap().build();
        assert_eq!(buf[0], 0x00);
        assert_eq!(buf[1], 0xFA);
        assert_eq!(&buf[2..7], b"AB12C");
        assert_eq!(&buf[7..], &[0, 0]);
    }

    #[test]
    fn test_write_short_serial_is_zero_padded() {
        let buf = WriteSerial::new("R1").unwrap().build();
        assert_eq!(buf, [0x00, 0xFA, b'R', b'1', 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_serial_too_long() {
        assert!(matches!(
            WriteSerial::new("TOOLONG"),
            Err(RelayError::SerialTooLong { len: 7 })
        ));
        // Length is measured in bytes
        assert!(SerialNumber::new("ÄÄÄ").is_err());
    }

    #[test]
    fn test_serial_decode() {
        let payload = *b"RLY01\0\0\0";
        let sn = SerialNumber::parse(&payload).unwrap();
        assert_eq!(sn.to_string(), "RLY01");
        assert_eq!(sn.as_raw_bytes(), b"RLY01");
    }

    #[test]
    fn test_serial_decode_keeps_raw_padding() {
        let payload = [b'A', b'B', 0, 0, 0, 0xAA, 0xBB, 0xCC];
        let sn = SerialNumber::parse(&payload).unwrap();
        assert_eq!(sn.as_bytes(), b"AB");
        assert_eq!(sn.as_raw_bytes(), &[b'A', b'B', 0, 0, 0]);
        assert_eq!(sn, SerialNumber::new("AB").unwrap());
    }

    #[test]
    fn test_serial_round_trip_through_both_layouts() {
        for layout in [ReportLayout::Bare, ReportLayout::LeadingReportId] {
            let written = WriteSerial::new("X9").unwrap().build();
            // Device echoes the stored bytes at the start of the payload
            let mut raw = [0u8; REPORT_SIZE];
            let off = layout.payload_offset();
            raw[off..off + SERIAL_LEN].copy_from_slice(&written[2..2 + SERIAL_LEN]);

            let sn = SerialNumber::parse(normalize_response(&raw, layout)).unwrap();
            assert_eq!(sn.to_string(), "X9");
        }
    }

    #[test]
    fn test_query_is_all_zero() {
        assert_eq!(FeatureQuery.build(), [0u8; REPORT_SIZE]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(ChannelStatus::from_bitmap(0x01)).unwrap();
        assert_eq!(json["bitmap"], 1);
        assert_eq!(json["channels"][0], "on");
        assert_eq!(json["channels"][1], "off");
    }
}
