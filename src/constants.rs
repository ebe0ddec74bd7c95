// Head layout constants. All multi-byte fields are little-endian.

/// Size in bytes of the payload size field (i32) that opens both heads.
pub const PAYLOAD_SIZE_FIELD_SIZE: usize = 4;

/// Byte offset where the 8-byte request ID (i64) begins, in both heads.
/// This is the unique request/response correlation ID.
pub const REQUEST_ID_OFFSET: usize = 4;

/// Byte offset of the 2-byte service ID (u16) in a request head.
pub const SERVICE_ID_OFFSET: usize = 12;

/// Byte offset of the 2-byte method ID (u16) in a request head.
pub const METHOD_ID_OFFSET: usize = 14;

/// Byte offset of the 4-byte error code (i32) in a response head.
pub const ERROR_CODE_OFFSET: usize = 12;

/// Total size of a request head: payload size + request ID + service ID
/// + method ID.
pub const REQUEST_HEAD_SIZE: usize = 16;

/// Total size of a response head: payload size + request ID + error code.
pub const RESPONSE_HEAD_SIZE: usize = 16;

/// Upper bound on the payload of a single frame (128 MiB). A head whose
/// payload size field is negative or larger than this kills the connection.
pub const MAX_PAYLOAD_SIZE: i32 = 128 * 1024 * 1024;
