use num_enum::{FromPrimitive, IntoPrimitive};

/// Status carried in the third field of every response head.
///
/// An [`ErrorCode::Ok`] response carries the encoded reply as its payload;
/// every other code is sent header-only with a payload size of zero. Codes
/// this build does not know are carried through as [`ErrorCode::Unrecognized`]
/// rather than treated as a protocol violation, so a newer peer can introduce
/// codes without killing the connection.
#[repr(i32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum ErrorCode {
    Ok = 0,
    /// No handler is registered for the requested (service, method) pair.
    UnknownApi = 1,
    /// The handler's argument decoder rejected the request payload.
    ReadArgError = 2,
    /// The handler failed, or its reply could not be encoded.
    ServerInternalError = 3,
    /// Any other nonzero value.
    #[num_enum(catch_all)]
    Unrecognized(i32),
}
