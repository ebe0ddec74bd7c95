use std::fmt;

use crate::constants::MAX_PAYLOAD_SIZE;

/// A violation of the framing layout.
///
/// Framing carries no delimiters, so once a head fails validation the stream
/// offset can no longer be trusted. Either variant is fatal to its
/// connection; no resynchronization is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A decoded head carried a negative payload size or one above
    /// [`MAX_PAYLOAD_SIZE`].
    InvalidPayloadSize(i32),

    /// An outgoing payload exceeds [`MAX_PAYLOAD_SIZE`] and cannot be framed.
    PayloadTooLarge(usize),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidPayloadSize(size) => {
                write!(f, "invalid payload size {} (max {})", size, MAX_PAYLOAD_SIZE)
            }
            ProtocolError::PayloadTooLarge(len) => {
                write!(
                    f,
                    "payload of {} bytes exceeds the limit of {} bytes",
                    len, MAX_PAYLOAD_SIZE
                )
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
