mod error_code;
mod protocol_error;
mod request_head;
mod response_head;

pub use error_code::ErrorCode;
pub use protocol_error::ProtocolError;
pub use request_head::RequestHead;
pub use response_head::ResponseHead;
