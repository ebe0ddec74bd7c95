use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::rpc::RpcMethod;
use crate::wire::ErrorCode;

/// What a handler gets to know about the invocation it is serving.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub request_id: i64,
    pub service_id: u16,
    pub method_id: u16,
    /// Address of the calling peer, when the transport has one.
    pub peer_addr: Option<SocketAddr>,
}

/// Error type handlers return. Mapped to
/// [`ErrorCode::ServerInternalError`] on the wire; the value itself never
/// crosses the network and is only logged.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A handler after type erasure: raw argument payload in, encoded reply
/// payload out, every failure already collapsed to the wire code it
/// answers with.
pub type RpcHandler = Arc<
    dyn Fn(CallContext, Bytes) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ErrorCode>> + Send>>
        + Send
        + Sync,
>;

/// Routing table from `(service_id, method_id)` to handlers.
///
/// Populated before the server starts and immutable afterwards, which is
/// why lookups need no locking.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<(u16, u16), RpcHandler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers the handler for method `M`.
    ///
    /// The typed closure is wrapped into the erased form: an argument that
    /// fails to decode answers [`ErrorCode::ReadArgError`] without invoking
    /// the closure, and a closure error or unencodable reply answers
    /// [`ErrorCode::ServerInternalError`].
    pub fn register<M, F, Fut>(&mut self, handler: F) -> Result<(), DuplicateHandlerError>
    where
        M: RpcMethod + 'static,
        M::Arg: Send + 'static,
        M::Reply: Send + 'static,
        F: Fn(CallContext, M::Arg) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Reply, HandlerError>> + Send + 'static,
    {
        match self.handlers.entry((M::SERVICE_ID, M::METHOD_ID)) {
            Entry::Occupied(_) => Err(DuplicateHandlerError {
                service_id: M::SERVICE_ID,
                method_id: M::METHOD_ID,
            }),
            Entry::Vacant(entry) => {
                let handler = Arc::new(handler);
                let wrapped = move |context: CallContext, body: Bytes| {
                    let handler = Arc::clone(&handler);
                    Box::pin(async move {
                        let arg = M::decode_arg(&body).map_err(|e| {
                            tracing::debug!(
                                "rejecting request {}: undecodable argument: {}",
                                context.request_id,
                                e
                            );
                            ErrorCode::ReadArgError
                        })?;
                        let reply = handler(context, arg).await.map_err(|e| {
                            tracing::warn!(
                                "handler for service {} method {} failed: {}",
                                context.service_id,
                                context.method_id,
                                e
                            );
                            ErrorCode::ServerInternalError
                        })?;
                        M::encode_reply(reply).map_err(|e| {
                            tracing::error!(
                                "reply for service {} method {} could not be encoded: {}",
                                context.service_id,
                                context.method_id,
                                e
                            );
                            ErrorCode::ServerInternalError
                        })
                    })
                        as Pin<Box<dyn Future<Output = Result<Vec<u8>, ErrorCode>> + Send>>
                };
                entry.insert(Arc::new(wrapped));
                Ok(())
            }
        }
    }

    /// Looks up the handler for a `(service, method)` pair.
    pub fn lookup(&self, service_id: u16, method_id: u16) -> Option<&RpcHandler> {
        self.handlers.get(&(service_id, method_id))
    }
}

/// Returned by [`HandlerTable::register`] when a `(service, method)` pair
/// already has a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateHandlerError {
    pub service_id: u16,
    pub method_id: u16,
}

impl fmt::Display for DuplicateHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a handler for service {} method {} is already registered",
            self.service_id, self.method_id
        )
    }
}

impl std::error::Error for DuplicateHandlerError {}
