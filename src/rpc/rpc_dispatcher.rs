use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::codec::{ConnectionError, FrameEncoder, FrameReader};
use crate::rpc::{CallContext, HandlerTable};
use crate::wire::{ErrorCode, RequestHead};

type BoxedReadHalf = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriteHalf = Box<dyn AsyncWrite + Send + Unpin>;

/// Write half of a dispatched connection, shared by every in-flight handler
/// task. The mutex is the only serialization point for responses: whichever
/// task locks it next writes its whole frame, so frames never interleave
/// while completion order stays up to the handlers.
struct ResponseWriter {
    io: BoxedWriteHalf,
    encoder: FrameEncoder,
}

impl ResponseWriter {
    async fn write_response(&mut self, request_id: i64, body: &[u8]) -> io::Result<()> {
        let ResponseWriter { io, encoder } = self;
        match encoder.encode_response(request_id, body) {
            Ok(frame) => {
                io.write_all(frame).await?;
                io.flush().await
            }
            Err(e) => {
                // The handler produced a reply the framing cannot carry.
                tracing::error!("reply for request {} cannot be framed: {}", request_id, e);
                let frame = encoder.encode_error_response(request_id, ErrorCode::ServerInternalError);
                io.write_all(frame).await?;
                io.flush().await
            }
        }
    }

    async fn write_error(&mut self, request_id: i64, code: ErrorCode) -> io::Result<()> {
        let ResponseWriter { io, encoder } = self;
        let frame = encoder.encode_error_response(request_id, code);
        io.write_all(frame).await?;
        io.flush().await
    }
}

/// The serving end of one accepted connection.
///
/// Reads request frames and hands each one to its handler in a freshly
/// spawned task, so a slow call never holds up the ones queued behind it;
/// responses go back whenever their handlers finish, in any order. The
/// read loop itself never writes and never blocks on the response mutex.
pub struct RpcDispatcher {
    reader: FrameReader<BoxedReadHalf>,
    writer: Arc<Mutex<ResponseWriter>>,
    handlers: Arc<HandlerTable>,
    peer_addr: Option<SocketAddr>,
    cancel: CancellationToken,
}

impl RpcDispatcher {
    /// Takes ownership of an accepted connection.
    pub fn new<S>(
        io: S,
        handlers: Arc<HandlerTable>,
        peer_addr: Option<SocketAddr>,
        cancel: CancellationToken,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(io);
        Self {
            reader: FrameReader::new(Box::new(read_half) as BoxedReadHalf),
            writer: Arc::new(Mutex::new(ResponseWriter {
                io: Box::new(write_half),
                encoder: FrameEncoder::new(),
            })),
            handlers,
            peer_addr,
            cancel,
        }
    }

    /// Serves the connection until the peer closes it, the token is
    /// cancelled, or the peer violates the protocol.
    ///
    /// EOF and cancellation are clean terminations. A [`ConnectionError`]
    /// is returned for the caller to log; either way the read half is
    /// dropped on return, while handler tasks still in flight write their
    /// responses if the peer is around to receive them and log at debug
    /// level if not.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                frame = self.reader.read_request() => frame?,
            };
            let Some((head, body)) = frame else {
                return Ok(());
            };
            self.dispatch(head, body);
        }
    }

    /// Routes one request to its handler task, or to an `UnknownApi`
    /// answer when nothing is registered for the pair.
    fn dispatch(&self, head: RequestHead, body: Bytes) {
        let context = CallContext {
            request_id: head.request_id,
            service_id: head.service_id,
            method_id: head.method_id,
            peer_addr: self.peer_addr,
        };

        let Some(handler) = self
            .handlers
            .lookup(head.service_id, head.method_id)
            .cloned()
        else {
            tracing::debug!(
                "no handler for service {} method {}, answering UnknownApi",
                head.service_id,
                head.method_id
            );
            let writer = Arc::clone(&self.writer);
            tokio::spawn(async move {
                let written = writer
                    .lock()
                    .await
                    .write_error(context.request_id, ErrorCode::UnknownApi)
                    .await;
                if let Err(e) = written {
                    tracing::debug!("response for request {} not written: {}", context.request_id, e);
                }
            });
            return;
        };

        let writer = Arc::clone(&self.writer);
        tokio::spawn(async move {
            let outcome = handler(context, body).await;
            let mut writer = writer.lock().await;
            let written = match outcome {
                Ok(reply) => writer.write_response(context.request_id, &reply).await,
                Err(code) => writer.write_error(context.request_id, code).await,
            };
            if let Err(e) = written {
                tracing::debug!("response for request {} not written: {}", context.request_id, e);
            }
        });
    }
}
