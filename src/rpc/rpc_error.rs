use std::fmt;
use std::io;

use crate::wire::{ErrorCode, ProtocolError};

/// Ways a call can fail, from the caller's perspective.
#[derive(Debug)]
pub enum RpcError {
    /// The transport failed while the call was being sent.
    Io(io::Error),

    /// The framing layout was violated, killing the connection.
    Protocol(ProtocolError),

    /// The server answered with a nonzero error code.
    Remote(ErrorCode),

    /// The argument could not be serialized. Nothing reached the network.
    EncodeArg(io::Error),

    /// The reply arrived but could not be deserialized. Fails only this
    /// call; the connection stays usable.
    DecodeReply(io::Error),

    /// The client was stopped before the call completed.
    Stopped,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Io(e) => write!(f, "I/O error: {}", e),
            RpcError::Protocol(e) => write!(f, "protocol violation: {}", e),
            RpcError::Remote(code) => write!(f, "remote error: {:?}", code),
            RpcError::EncodeArg(e) => write!(f, "failed to encode argument: {}", e),
            RpcError::DecodeReply(e) => write!(f, "failed to decode reply: {}", e),
            RpcError::Stopped => write!(f, "client is stopped"),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcError::Io(e) | RpcError::EncodeArg(e) | RpcError::DecodeReply(e) => Some(e),
            RpcError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RpcError {
    fn from(e: io::Error) -> Self {
        RpcError::Io(e)
    }
}
