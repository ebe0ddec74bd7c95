mod connection_error;
mod frame_encoder;
mod frame_reader;

pub use connection_error::ConnectionError;
pub use frame_encoder::FrameEncoder;
pub use frame_reader::FrameReader;
