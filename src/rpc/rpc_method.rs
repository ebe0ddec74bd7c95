use std::io;

use crate::rpc::{RpcClient, RpcError};

/// Compile-time descriptor of one remotely callable method.
///
/// Implementations are unit types: the IDs locate the method on the wire
/// and the four functions define how its argument and reply are serialized.
/// The rest of the crate is schemaless (frames carry opaque payload bytes),
/// so swapping serialization technology means nothing more than implementing
/// this trait with a different library. Both sides of a connection must
/// agree on the encoding per method.
pub trait RpcMethod {
    /// Identifier of the service this method belongs to.
    const SERVICE_ID: u16;

    /// Identifier of the method within its service.
    const METHOD_ID: u16;

    /// The argument type the method accepts.
    type Arg;

    /// The reply type the method produces.
    type Reply;

    /// Encodes an argument into a request payload.
    fn encode_arg(arg: Self::Arg) -> Result<Vec<u8>, io::Error>;

    /// Decodes a request payload back into a typed argument.
    fn decode_arg(bytes: &[u8]) -> Result<Self::Arg, io::Error>;

    /// Encodes a reply into a response payload.
    fn encode_reply(reply: Self::Reply) -> Result<Vec<u8>, io::Error>;

    /// Decodes a response payload back into a typed reply.
    fn decode_reply(bytes: &[u8]) -> Result<Self::Reply, io::Error>;
}

/// Call-site sugar over [`RpcClient::call`].
///
/// The blanket implementation below lets any method type be invoked as
/// `M::call(&client, arg)` without a per-method implementation.
#[async_trait::async_trait]
pub trait RpcCall: RpcMethod {
    async fn call(client: &RpcClient, arg: Self::Arg) -> Result<Self::Reply, RpcError>;
}

#[async_trait::async_trait]
impl<M> RpcCall for M
where
    M: RpcMethod + Send + Sync + 'static,
    M::Arg: Send + 'static,
    M::Reply: Send + 'static,
{
    async fn call(client: &RpcClient, arg: Self::Arg) -> Result<Self::Reply, RpcError> {
        client.call::<M>(arg).await
    }
}
