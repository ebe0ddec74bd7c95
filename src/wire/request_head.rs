use bytes::{Buf, BufMut};

use crate::constants::{MAX_PAYLOAD_SIZE, REQUEST_HEAD_SIZE};
use crate::wire::ProtocolError;

/// Head of a request frame.
///
/// Layout: `[payload_size: i32][request_id: i64][service_id: u16]
/// [method_id: u16]`, 16 bytes little-endian, immediately followed by
/// `payload_size` bytes of encoded argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHead {
    pub payload_size: i32,
    pub request_id: i64,
    pub service_id: u16,
    pub method_id: u16,
}

impl RequestHead {
    /// Reads a head from the front of `buf` without consuming anything.
    ///
    /// Returns `Ok(None)` while fewer than [`REQUEST_HEAD_SIZE`] bytes are
    /// buffered; the caller retries once more bytes have arrived. The
    /// payload size is validated here, before any body is sliced off the
    /// stream, so a corrupt head can never put the stream out of sync.
    pub fn try_read(mut buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < REQUEST_HEAD_SIZE {
            return Ok(None);
        }

        let head = RequestHead {
            payload_size: buf.get_i32_le(),
            request_id: buf.get_i64_le(),
            service_id: buf.get_u16_le(),
            method_id: buf.get_u16_le(),
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
        buf.put_u16_le(self.service_id);
        buf.put_u16_le(self.method_id);
    }
}
