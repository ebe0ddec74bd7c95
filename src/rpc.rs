mod rpc_client;
mod rpc_dispatcher;
mod rpc_error;
mod rpc_handler;
mod rpc_method;
mod rpc_pending_calls;
mod rpc_server;

pub use rpc_client::RpcClient;
pub use rpc_dispatcher::RpcDispatcher;
pub use rpc_error::RpcError;
pub use rpc_handler::{CallContext, DuplicateHandlerError, HandlerError, HandlerTable, RpcHandler};
pub use rpc_method::{RpcCall, RpcMethod};
pub use rpc_pending_calls::{CallCompletion, PendingCalls};
pub use rpc_server::RpcServer;
