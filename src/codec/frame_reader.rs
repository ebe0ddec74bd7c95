use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::ConnectionError;
use crate::constants::{REQUEST_HEAD_SIZE, RESPONSE_HEAD_SIZE};
use crate::wire::{RequestHead, ResponseHead};

/// Decode half of a connection's framing state.
///
/// Owns the read half of the transport plus an accumulation buffer. A frame
/// is yielded only once its head and full payload are buffered; a read that
/// lands mid-frame leaves the buffered prefix in place and suspends for more
/// bytes, so any byte-split of a valid frame sequence decodes to the same
/// frames. Payloads are sliced off the buffer without copying. The buffer
/// grows to the largest head-plus-payload span seen on the connection and
/// retains that capacity.
pub struct FrameReader<R> {
    io: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(io: R) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Reads the next request frame.
    ///
    /// Returns `Ok(None)` on a clean EOF at a frame boundary. EOF in the
    /// middle of a frame surfaces as an `UnexpectedEof` I/O error, and a
    /// head that fails validation as [`ConnectionError::Protocol`]; after
    /// either, nothing further is consumed from the stream.
    pub async fn read_request(&mut self) -> Result<Option<(RequestHead, Bytes)>, ConnectionError> {
        loop {
            if let Some(head) = RequestHead::try_read(&self.buf)? {
                if let Some(body) = self.try_split_body(REQUEST_HEAD_SIZE, head.payload_size) {
                    return Ok(Some((head, body)));
                }
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// Reads the next response frame. Same contract as
    /// [`FrameReader::read_request`].
    pub async fn read_response(
        &mut self,
    ) -> Result<Option<(ResponseHead, Bytes)>, ConnectionError> {
        loop {
            if let Some(head) = ResponseHead::try_read(&self.buf)? {
                if let Some(body) = self.try_split_body(RESPONSE_HEAD_SIZE, head.payload_size) {
                    return Ok(Some((head, body)));
                }
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// Consumes head and payload from the buffer once both are fully
    /// present, returning the payload. `payload_size` has already been
    /// validated non-negative by the head decode.
    fn try_split_body(&mut self, head_size: usize, payload_size: i32) -> Option<Bytes> {
        let body_len = payload_size as usize;
        if self.buf.len() < head_size + body_len {
            return None;
        }
        self.buf.advance(head_size);
        Some(self.buf.split_to(body_len).freeze())
    }

    /// Reads more bytes from the transport into the buffer.
    ///
    /// `Ok(true)` means progress was made, `Ok(false)` a clean EOF with an
    /// empty buffer. EOF with buffered bytes left means the peer quit
    /// mid-frame and is an error.
    async fn fill(&mut self) -> Result<bool, ConnectionError> {
        if self.io.read_buf(&mut self.buf).await? == 0 {
            if !self.buf.is_empty() {
                return Err(ConnectionError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                )));
            }
            return Ok(false);
        }
        Ok(true)
    }
}
