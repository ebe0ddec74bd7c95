use crate::constants::{MAX_PAYLOAD_SIZE, REQUEST_HEAD_SIZE, RESPONSE_HEAD_SIZE};
use crate::wire::{ErrorCode, ProtocolError, RequestHead, ResponseHead};

/// Encode half of a connection's framing state.
///
/// Every operation writes head and payload into one reusable scratch buffer
/// and returns a slice borrowing it; the borrow ends before the next encode.
/// The scratch grows to the largest frame encoded so far and keeps that
/// capacity for the life of the connection, bounded by the head size plus
/// [`MAX_PAYLOAD_SIZE`].
///
/// An encoder never leaves the write half it belongs to: the client keeps it
/// inside the mutex-guarded writer state, the dispatcher inside the shared
/// response writer. Whoever holds that lock is the only task encoding, so
/// the scratch is never contended.
pub struct FrameEncoder {
    scratch: Vec<u8>,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self {
            scratch: Vec::new(),
        }
    }

    /// Frames a request carrying `body` as its encoded argument.
    ///
    /// Fails with [`ProtocolError::PayloadTooLarge`] when `body` exceeds
    /// [`MAX_PAYLOAD_SIZE`]; nothing is written in that case.
    pub fn encode_request(
        &mut self,
        request_id: i64,
        service_id: u16,
        method_id: u16,
        body: &[u8],
    ) -> Result<&[u8], ProtocolError> {
        let head = RequestHead {
            payload_size: checked_payload_size(body)?,
            request_id,
            service_id,
            method_id,
        };

        self.scratch.clear();
        self.scratch.reserve(REQUEST_HEAD_SIZE + body.len());
        head.write_to(&mut self.scratch);
        self.scratch.extend_from_slice(body);
        Ok(&self.scratch)
    }

    /// Frames a success response carrying `body` as its encoded reply.
    pub fn encode_response(
        &mut self,
        request_id: i64,
        body: &[u8],
    ) -> Result<&[u8], ProtocolError> {
        let head = ResponseHead {
            payload_size: checked_payload_size(body)?,
            request_id,
            error_code: ErrorCode::Ok,
        };

        self.scratch.clear();
        self.scratch.reserve(RESPONSE_HEAD_SIZE + body.len());
        head.write_to(&mut self.scratch);
        self.scratch.extend_from_slice(body);
        Ok(&self.scratch)
    }

    /// Frames a header-only error response: the code rides in the head and
    /// the payload size is zero.
    pub fn encode_error_response(&mut self, request_id: i64, code: ErrorCode) -> &[u8] {
        let head = ResponseHead {
            payload_size: 0,
            request_id,
            error_code: code,
        };

        self.scratch.clear();
        head.write_to(&mut self.scratch);
        &self.scratch
    }
}

fn checked_payload_size(body: &[u8]) -> Result<i32, ProtocolError> {
    if body.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(ProtocolError::PayloadTooLarge(body.len()));
    }
    Ok(body.len() as i32)
}
