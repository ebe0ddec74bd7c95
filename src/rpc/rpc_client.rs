use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;

use crate::codec::{ConnectionError, FrameEncoder, FrameReader};
use crate::rpc::{PendingCalls, RpcError, RpcMethod};
use crate::wire::ErrorCode;

type BoxedReadHalf = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriteHalf = Box<dyn AsyncWrite + Send + Unpin>;

/// Write-half state of a client connection.
///
/// Keeping all of it behind one mutex makes the guard the connection's send
/// permit: whoever holds it owns the encoder scratch, the ID counter, and
/// the stop flag, so frames from concurrent calls never interleave and ID
/// allocation is a plain increment.
struct ClientWriter {
    io: BoxedWriteHalf,
    encoder: FrameEncoder,
    next_request_id: i64,
    stopped: bool,
}

/// The calling end of a connection.
///
/// Cheap to share by reference: any number of tasks may have calls in
/// flight at once, multiplexed over the single connection and correlated
/// back by request ID. A dedicated receive task, spawned at construction,
/// resolves completions as response frames arrive, in whatever order the
/// server finished them.
pub struct RpcClient {
    writer: Arc<Mutex<ClientWriter>>,
    pending: Arc<PendingCalls>,
    cancel: CancellationToken,
}

impl RpcClient {
    /// Takes ownership of an established connection and spawns its receive
    /// loop. Must be called from within a Tokio runtime.
    pub fn new<S>(io: S) -> RpcClient
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(io);

        let writer = Arc::new(Mutex::new(ClientWriter {
            io: Box::new(write_half),
            encoder: FrameEncoder::new(),
            next_request_id: 1,
            stopped: false,
        }));
        let pending = Arc::new(PendingCalls::new());
        let cancel = CancellationToken::new();

        tokio::spawn(receive_loop(
            FrameReader::new(Box::new(read_half) as BoxedReadHalf),
            Arc::clone(&writer),
            Arc::clone(&pending),
            cancel.clone(),
        ));

        RpcClient {
            writer,
            pending,
            cancel,
        }
    }

    /// Connects over TCP and wraps the stream in a client.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<RpcClient> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Invokes method `M` with `arg` and awaits its typed reply.
    ///
    /// The pending entry is registered before the first byte reaches the
    /// wire, both under the send permit, so the receive loop can resolve
    /// the call even when the response arrives while this task is still
    /// releasing the permit. A reply that fails to decode fails only this
    /// call.
    pub async fn call<M: RpcMethod>(&self, arg: M::Arg) -> Result<M::Reply, RpcError> {
        let body = M::encode_arg(arg).map_err(RpcError::EncodeArg)?;

        let (completion, resolved) = oneshot::channel();
        {
            let mut writer = self.writer.lock().await;
            if writer.stopped {
                return Err(RpcError::Stopped);
            }
            let request_id = writer.next_request_id;
            writer.next_request_id += 1;

            let ClientWriter { io, encoder, .. } = &mut *writer;
            let frame = encoder
                .encode_request(request_id, M::SERVICE_ID, M::METHOD_ID, &body)
                .map_err(RpcError::Protocol)?;

            self.pending.register(request_id, completion);

            let sent = match io.write_all(frame).await {
                Ok(()) => io.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = sent {
                let _ = self.pending.try_remove(request_id);
                return Err(RpcError::Io(e));
            }
        }

        let reply = match resolved.await {
            Ok(result) => result?,
            Err(_) => return Err(RpcError::Stopped),
        };
        M::decode_reply(&reply).map_err(RpcError::DecodeReply)
    }

    /// Stops the client: new calls fail fast with [`RpcError::Stopped`]
    /// without touching the network, and every in-flight call fails the
    /// same way. Idempotent and safe to race from multiple tasks.
    pub async fn stop(&self) {
        stop_connection(&self.writer, &self.pending, &self.cancel).await;
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        // Wakes the receive loop, which runs the stop path with the Arcs
        // it holds.
        self.cancel.cancel();
    }
}

/// Shuts the connection down exactly once: later calls see the stop flag,
/// the receive loop sees the cancellation, and every outstanding completion
/// is failed. Both [`RpcClient::stop`] and the receive loop's exit land
/// here.
async fn stop_connection(
    writer: &Mutex<ClientWriter>,
    pending: &PendingCalls,
    cancel: &CancellationToken,
) {
    {
        let mut writer = writer.lock().await;
        if writer.stopped {
            return;
        }
        writer.stopped = true;
        if let Err(e) = writer.io.shutdown().await {
            tracing::debug!("connection shutdown failed: {}", e);
        }
    }

    cancel.cancel();
    for completion in pending.drain_all() {
        let _ = completion.send(Err(RpcError::Stopped));
    }
}

/// Per-connection receive task: resolves or discards response frames until
/// the connection ends, then stops the client so nothing waits forever.
async fn receive_loop(
    mut reader: FrameReader<BoxedReadHalf>,
    writer: Arc<Mutex<ClientWriter>>,
    pending: Arc<PendingCalls>,
    cancel: CancellationToken,
) {
    let outcome = loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            frame = reader.read_response() => frame,
        };
        match frame {
            Ok(Some((head, body))) => match pending.try_remove(head.request_id) {
                Some(completion) => {
                    let result = match head.error_code {
                        ErrorCode::Ok => Ok(body),
                        code => Err(RpcError::Remote(code)),
                    };
                    let _ = completion.send(result);
                }
                None => {
                    // Tolerated: the call may have been failed and removed
                    // after its request was already on the wire.
                    tracing::debug!(
                        "discarding response for unknown request ID {}",
                        head.request_id
                    );
                }
            },
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    match outcome {
        Ok(()) => tracing::info!("client receive loop exit"),
        Err(ConnectionError::Io(e)) => tracing::warn!("client connection lost: {}", e),
        Err(ConnectionError::Protocol(e)) => {
            tracing::error!("client killing connection: {}", e)
        }
    }

    stop_connection(&writer, &pending, &cancel).await;
}
