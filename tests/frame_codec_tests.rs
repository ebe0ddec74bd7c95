use bytes::BufMut;
use callmux::codec::{ConnectionError, FrameEncoder, FrameReader};
use callmux::constants::{MAX_PAYLOAD_SIZE, REQUEST_HEAD_SIZE, RESPONSE_HEAD_SIZE};
use callmux::wire::{ErrorCode, ProtocolError};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn request_frames_round_trip_through_the_reader() {
    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    let mut encoder = FrameEncoder::new();
    let frame = encoder.encode_request(1, 7, 9, b"hello").unwrap();
    assert_eq!(frame.len(), REQUEST_HEAD_SIZE + 5);

    wire.write_all(frame).await.unwrap();
    drop(wire);

    let (head, body) = reader.read_request().await.unwrap().unwrap();
    assert_eq!(head.request_id, 1);
    assert_eq!(head.service_id, 7);
    assert_eq!(head.method_id, 9);
    assert_eq!(head.payload_size, 5);
    assert_eq!(&body[..], b"hello");

    // The peer hung up at a frame boundary.
    assert!(reader.read_request().await.unwrap().is_none());
}

#[tokio::test]
async fn response_frames_round_trip_through_the_reader() {
    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    let mut encoder = FrameEncoder::new();
    wire.write_all(encoder.encode_response(3, b"pong").unwrap())
        .await
        .unwrap();
    wire.write_all(encoder.encode_error_response(4, ErrorCode::UnknownApi))
        .await
        .unwrap();
    drop(wire);

    let (head, body) = reader.read_response().await.unwrap().unwrap();
    assert_eq!(head.request_id, 3);
    assert_eq!(head.error_code, ErrorCode::Ok);
    assert_eq!(&body[..], b"pong");

    // Error responses are header-only.
    let (head, body) = reader.read_response().await.unwrap().unwrap();
    assert_eq!(head.request_id, 4);
    assert_eq!(head.error_code, ErrorCode::UnknownApi);
    assert_eq!(head.payload_size, 0);
    assert!(body.is_empty());

    assert!(reader.read_response().await.unwrap().is_none());
}

#[tokio::test]
async fn frames_survive_byte_at_a_time_delivery() {
    let mut encoder = FrameEncoder::new();
    let mut bytes = encoder.encode_request(1, 2, 3, b"first frame").unwrap().to_vec();
    bytes.extend_from_slice(encoder.encode_request(2, 2, 3, b"").unwrap());
    bytes.extend_from_slice(encoder.encode_request(3, 5, 6, b"third").unwrap());

    let (mut wire, far_end) = tokio::io::duplex(16);
    let mut reader = FrameReader::new(far_end);

    // Drip the stream one byte per write so every possible split point is
    // exercised.
    let writer = tokio::spawn(async move {
        for byte in bytes {
            wire.write_all(&[byte]).await.unwrap();
        }
    });

    let (head, body) = reader.read_request().await.unwrap().unwrap();
    assert_eq!(head.request_id, 1);
    assert_eq!(&body[..], b"first frame");

    let (head, body) = reader.read_request().await.unwrap().unwrap();
    assert_eq!(head.request_id, 2);
    assert!(body.is_empty());

    let (head, body) = reader.read_request().await.unwrap().unwrap();
    assert_eq!(head.request_id, 3);
    assert_eq!(head.service_id, 5);
    assert_eq!(&body[..], b"third");

    writer.await.unwrap();
    assert!(reader.read_request().await.unwrap().is_none());
}

#[tokio::test]
async fn back_to_back_frames_decode_from_one_write() {
    let mut encoder = FrameEncoder::new();
    let mut bytes = encoder.encode_response(10, b"abc").unwrap().to_vec();
    bytes.extend_from_slice(encoder.encode_response(11, b"defgh").unwrap());

    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    wire.write_all(&bytes).await.unwrap();
    drop(wire);

    let (head, body) = reader.read_response().await.unwrap().unwrap();
    assert_eq!(head.request_id, 10);
    assert_eq!(&body[..], b"abc");

    let (head, body) = reader.read_response().await.unwrap().unwrap();
    assert_eq!(head.request_id, 11);
    assert_eq!(&body[..], b"defgh");

    assert!(reader.read_response().await.unwrap().is_none());
}

#[test]
fn encoder_reuses_its_scratch_between_frames() {
    let mut encoder = FrameEncoder::new();

    let frame = encoder.encode_request(1, 1, 1, b"a long first payload").unwrap();
    assert_eq!(frame.len(), REQUEST_HEAD_SIZE + 20);

    // A shorter follow-up frame must not carry leftovers of the first.
    let frame = encoder.encode_error_response(2, ErrorCode::ReadArgError);
    assert_eq!(frame.len(), RESPONSE_HEAD_SIZE);
}

#[test]
fn oversized_payloads_are_refused_at_encode() {
    let body = vec![0u8; MAX_PAYLOAD_SIZE as usize + 1];
    let mut encoder = FrameEncoder::new();

    assert_eq!(
        encoder.encode_request(1, 1, 1, &body).unwrap_err(),
        ProtocolError::PayloadTooLarge(MAX_PAYLOAD_SIZE as usize + 1)
    );
    assert_eq!(
        encoder.encode_response(1, &body).unwrap_err(),
        ProtocolError::PayloadTooLarge(MAX_PAYLOAD_SIZE as usize + 1)
    );
}

#[tokio::test]
async fn invalid_payload_sizes_kill_the_read() {
    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    let mut corrupt = Vec::new();
    corrupt.put_i32_le(-1);
    corrupt.put_i64_le(7);
    corrupt.put_u16_le(1);
    corrupt.put_u16_le(2);
    wire.write_all(&corrupt).await.unwrap();

    let err = reader.read_request().await.unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::Protocol(ProtocolError::InvalidPayloadSize(-1))
    ));
}

#[tokio::test]
async fn eof_mid_frame_is_an_error() {
    // A head promising ten payload bytes, followed by only four.
    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    let mut encoder = FrameEncoder::new();
    let frame = encoder.encode_request(1, 1, 1, b"ten bytes!").unwrap();
    wire.write_all(&frame[..REQUEST_HEAD_SIZE + 4]).await.unwrap();
    drop(wire);

    let err = reader.read_request().await.unwrap_err();
    match err {
        ConnectionError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("unexpected error: {other:?}"),
    }

    // A torn head is just as fatal.
    let (mut wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    wire.write_all(&frame[..7]).await.unwrap();
    drop(wire);

    let err = reader.read_request().await.unwrap_err();
    match err {
        ConnectionError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn clean_eof_yields_none() {
    let (wire, far_end) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(far_end);

    drop(wire);

    assert!(reader.read_request().await.unwrap().is_none());
}
