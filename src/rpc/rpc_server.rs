use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

use crate::rpc::{HandlerTable, RpcDispatcher};

/// TCP accept loop in front of [`RpcDispatcher`].
///
/// Every accepted connection gets its own dispatcher in its own task, so
/// connections cannot disturb each other; the handler table is shared.
/// Anything that can pair a byte stream with a [`HandlerTable`] can serve
/// this protocol; this type is the plain-TCP way to do it.
pub struct RpcServer {
    handlers: Arc<HandlerTable>,
    cancel: CancellationToken,
}

impl RpcServer {
    /// Wraps a fully populated handler table. The table cannot change once
    /// the server owns it.
    pub fn new(handlers: HandlerTable) -> Self {
        Self {
            handlers: Arc::new(handlers),
            cancel: CancellationToken::new(),
        }
    }

    /// Binds `addr` and serves until [`RpcServer::shutdown`].
    pub async fn serve<A: ToSocketAddrs>(self: Arc<Self>, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serves connections from a pre-bound listener.
    ///
    /// Useful when the caller binds port 0 and needs the actual address
    /// before the server starts accepting.
    pub async fn serve_with_listener(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("server listening on {}", local_addr);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("server on {} shutting down", local_addr);
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!("connection from {}", peer);

                    let dispatcher = RpcDispatcher::new(
                        stream,
                        Arc::clone(&self.handlers),
                        Some(peer),
                        self.cancel.child_token(),
                    );
                    tokio::spawn(async move {
                        match dispatcher.run().await {
                            Ok(()) => tracing::debug!("connection from {} closed", peer),
                            Err(e) => tracing::warn!("connection from {} failed: {}", peer, e),
                        }
                    });
                }
            }
        }
    }

    /// Requests shutdown: the accept loop stops and every connection's
    /// dispatch loop is cancelled. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
