//! Relay driver error types

use hidrelay_transport::TransportError;
use thiserror::Error;

use crate::protocol::{CHANNEL_COUNT, SERIAL_LEN};

/// Errors from relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Transport layer error (open, close, send, read)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel number outside ALL (0) and 1..=8
    #[error("Illegal channel number ({0}), expected 0 (all) or 1-{max}", max = CHANNEL_COUNT)]
    InvalidChannel(i64),

    /// Serial number longer than the device can store
    #[error("Serial number is {len} bytes, at most {max} allowed", max = SERIAL_LEN)]
    SerialTooLong { len: usize },

    /// Response payload shorter than the field being decoded
    #[error("Short response: expected at least {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },
}
