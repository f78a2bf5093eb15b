//! Unit tests for the binary SERP codec.
//!
//! Covers the exact wire layout, body-level rejection of malformed frames,
//! encoder limits, and driving the codec through `tokio_util` framing.

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};

use super::*;

mod property;

#[fixture]
fn addressed_request() -> Request {
    let mut request = Request::new(Method::Get, "/a").with_body("x");
    request.header = Header {
        message_id: MessageId::new(1),
        source: PeerId::new(2),
        destination: PeerId::new(3),
    };
    request
}

/// Run raw bytes through the SERP framer and return the single frame.
fn single_frame(bytes: &[u8]) -> SerpFrame {
    let mut framer = Framer::new(SerpRule, 1024);
    let mut fed = framer.feed(bytes);
    assert!(fed.error.is_none(), "unexpected framing error: {:?}", fed.error);
    assert_eq!(fed.frames.len(), 1, "expected exactly one frame");
    fed.frames.remove(0)
}

fn raw_frame(kind: u8, body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 5, 0, 1, 0, 2];
    bytes.extend_from_slice(&u32::try_from(body.len()).expect("small body").to_be_bytes());
    bytes.push(kind);
    bytes.extend_from_slice(body);
    bytes
}

#[rstest]
fn request_wire_layout_is_stable(addressed_request: Request) {
    let wire = encode(&Message::Request(addressed_request)).expect("encode request");
    assert_eq!(
        wire.as_ref(),
        &[
            0, 0, 0, 1, // message id
            0, 2, // source
            0, 3, // destination
            0, 0, 0, 6, // content length
            0, // kind
            0, // method
            0, 2, b'/', b'a', // target
            b'x', // payload
        ]
    );
}

#[test]
fn response_wire_layout_is_stable() {
    let mut response = Response::new(StatusCode::NotFound).with_body(Bytes::from_static(b"no"));
    response.header.message_id = MessageId::new(258);
    let wire = encode(&Message::Response(response)).expect("encode response");
    assert_eq!(
        wire.as_ref(),
        &[0, 0, 1, 2, 0, 0, 0, 0, 0, 0, 0, 4, 1, 0x01, 0x94, b'n', b'o']
    );
}

#[rstest]
fn decode_restores_request(addressed_request: Request) {
    let wire = encode(&Message::Request(addressed_request.clone())).expect("encode request");
    let frame = single_frame(&wire);
    assert_eq!(frame.header().kind, MessageKind::Request);
    assert_eq!(frame.header().content_length, 6);
    assert_eq!(
        decode(&frame).expect("decode request"),
        Message::Request(addressed_request)
    );
}

#[rstest]
#[case::empty_request(0, &[], ProtocolError::TruncatedBody { field: "method" })]
#[case::missing_target_length(0, &[0, 0], ProtocolError::TruncatedBody { field: "target length" })]
#[case::short_target(0, &[0, 0, 4, b'/', b'a'], ProtocolError::TruncatedBody { field: "target" })]
#[case::unknown_method(0, &[9, 0, 0], ProtocolError::UnknownMethod { method: "9".to_owned() })]
#[case::invalid_target(0, &[0, 0, 2, 0xff, 0xfe], ProtocolError::InvalidTarget)]
#[case::empty_response(1, &[0x00], ProtocolError::TruncatedBody { field: "status code" })]
#[case::unknown_status(1, &[0x01, 0x2b], ProtocolError::UnknownStatus { code: 299 })]
fn malformed_bodies_are_rejected(
    #[case] kind: u8,
    #[case] body: &[u8],
    #[case] expected: ProtocolError,
) {
    let frame = single_frame(&raw_frame(kind, body));
    assert_eq!(decode(&frame).expect_err("body should be rejected"), expected);
}

#[test]
fn unknown_kind_is_a_framing_error() {
    let mut framer = Framer::new(SerpRule, 1024);
    let fed = framer.feed(&raw_frame(7, &[0, 0]));
    assert!(fed.frames.is_empty());
    assert_eq!(fed.error, Some(FramingError::UnknownKind { value: 7 }));
    assert_eq!(framer.buffered_len(), 0);
}

#[test]
fn target_longer_than_u16_is_rejected() {
    let request = Request::new(Method::Post, "/".repeat(usize::from(u16::MAX) + 1));
    let err = encode(&Message::Request(request)).expect_err("target too long");
    assert!(matches!(
        err,
        CodecError::Protocol(ProtocolError::TargetTooLong { len }) if len == 65_536
    ));
}

#[test]
fn codec_encoder_enforces_max_frame_length() {
    let mut codec = SerpCodec::new(64);
    let response = Response::new(StatusCode::Ok).with_body(vec![0_u8; 64]);
    let mut dst = BytesMut::new();
    let err = codec
        .encode(Message::Response(response), &mut dst)
        .expect_err("oversized frame");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { size: 79, max: 64 })
    ));
    assert!(dst.is_empty());
}

#[test]
fn codec_decode_eof_reports_truncated_frame() {
    let mut codec = SerpCodec::default();
    let wire = encode(&Message::Response(
        Response::new(StatusCode::Ok).with_body("payload"),
    ))
    .expect("encode response");
    let mut buf = BytesMut::from(&wire[..wire.len() - 3]);

    assert!(codec.decode(&mut buf).expect("partial frame").is_none());
    let err = codec.decode_eof(&mut buf).expect_err("truncated at EOF");
    assert!(matches!(
        err,
        CodecError::Eof(EofError::MidFrame { bytes_received: 19, expected: 22 })
    ));
    assert!(buf.is_empty());
}

#[test]
fn codec_decode_eof_with_empty_buffer_returns_none() {
    let mut codec = SerpCodec::default();
    let mut buf = BytesMut::new();
    assert!(matches!(codec.decode_eof(&mut buf), Ok(None)));
}

#[tokio::test]
async fn framed_transport_round_trips_messages() {
    let (client, server) = tokio::io::duplex(64);
    let mut writer = FramedWrite::new(client, SerpCodec::default());
    let mut reader = FramedRead::new(server, SerpCodec::default());

    let request = Message::Request(Request::new(Method::Put, "/lamp").with_body(vec![7_u8; 200]));
    let response = Message::Response(Response::new(StatusCode::NoContent));

    let sent = vec![request, response];
    let expected = sent.clone();
    let send = tokio::spawn(async move {
        for message in sent {
            writer.send(message).await.expect("send message");
        }
    });

    for message in expected {
        let received = reader
            .next()
            .await
            .expect("stream ended early")
            .expect("decode message");
        assert_eq!(received, message);
    }
    send.await.expect("join writer");
}
