use bytes::{Buf, BufMut};

use crate::constants::{MAX_PAYLOAD_SIZE, RESPONSE_HEAD_SIZE};
use crate::wire::{ErrorCode, ProtocolError};

/// Head of a response frame.
///
/// Layout: `[payload_size: i32][request_id: i64][error_code: i32]`, 16 bytes
/// little-endian. An [`ErrorCode::Ok`] head is followed by `payload_size`
/// bytes of encoded reply; error heads are sent with a payload size of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub payload_size: i32,
    pub request_id: i64,
    pub error_code: ErrorCode,
}

impl ResponseHead {
    /// Reads a head from the front of `buf` without consuming anything.
    ///
    /// Returns `Ok(None)` while fewer than [`RESPONSE_HEAD_SIZE`] bytes are
    /// buffered. The payload size is validated before the caller slices the
    /// body; the error code is not, since unknown codes are tolerated.
    pub fn try_read(mut buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < RESPONSE_HEAD_SIZE {
            return Ok(None);
        }

        let head = ResponseHead {
            payload_size: buf.get_i32_le(),
            request_id: buf.get_i64_le(),
            error_code: ErrorCode::from(buf.get_i32_le()),
        };

        if head.payload_size < 0 || head.payload_size > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::InvalidPayloadSize(head.payload_size));
        }

        Ok(Some(head))
    }

    /// Writes the 16-byte encoding of this head into `buf`.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.payload_size);
        buf.put_i64_le(self.request_id);
        buf.put_i32_le(self.error_code.into());
    }
}
