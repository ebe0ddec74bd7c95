//! Typed, asynchronous RPC multiplexed over a single byte-stream connection.
//!
//! Many concurrent calls share one connection; request and response frames
//! are correlated by a per-connection request ID, so replies may arrive in
//! any order. The wire layout lives in [`wire`], the per-connection framing
//! state in [`codec`], and the client, dispatcher, and server in [`rpc`].
//! Argument and reply serialization is not baked in: each callable method
//! describes its own encoding through [`rpc::RpcMethod`].

pub mod codec;
pub mod constants;
pub mod rpc;
pub mod wire;
