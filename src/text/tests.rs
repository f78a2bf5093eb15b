//! Unit tests for the text protocol.

use bytes::{Bytes, BytesMut};
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};

use super::*;
use crate::frame::{BodyLength, FrameRule};


fn framer() -> Framer<TextRule> { Framer::new(TextRule::default(), 4096) }

fn decode_all(bytes: &[u8]) -> Vec<TextMessage> {
    let fed = framer().feed(bytes);
    assert!(fed.error.is_none(), "unexpected framing error: {:?}", fed.error);
    fed.frames
        .iter()
        .map(|frame| decode(frame).expect("decode text frame"))
        .collect()
}

#[test]
fn request_with_headers_and_length() {
    let messages = decode_all(b"SERP/1.0 PUT /lights/hall\nHost: hub\ncontent-length: 2\n\non");
    let [TextMessage::Request(request)] = messages.as_slice() else {
        panic!("expected one request, got {messages:?}");
    };
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/lights/hall");
    assert_eq!(request.headers, [("Host".to_owned(), "hub".to_owned())]);
    assert_eq!(request.header("host"), Some("hub"));
    assert_eq!(request.header("content-length"), None);
    assert_eq!(request.body, Bytes::from_static(b"on"));
}

#[test]
fn response_reason_keeps_spaces_and_crlf_is_tolerated() {
    let messages = decode_all(b"HTTP/1.1 404 Not Found Here\r\nContent-Length: 0\r\n\r\n");
    let [TextMessage::Response(response)] = messages.as_slice() else {
        panic!("expected one response, got {messages:?}");
    };
    assert_eq!(response.version, "HTTP/1.1");
    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.reason, "Not Found Here");
    assert!(response.body.is_empty());
}

#[test]
fn missing_length_takes_rest_of_chunk() {
    let mut framer = framer();
    let fed = framer.feed(b"SERP/1.0 POST /log\n\nline one\nline two");
    assert_eq!(fed.frames.len(), 1);
    assert_eq!(fed.frames[0].body(), b"line one\nline two");
    assert_eq!(framer.buffered_len(), 0);
}

#[test]
fn pipelined_messages_with_lengths_split_correctly() {
    let mut wire = BytesMut::new();
    let first = TextMessage::from(TextRequest::new(Method::Get, "/a").with_body("1"));
    let second = TextMessage::from(TextResponse::new(StatusCode::Created).with_body("22"));
    encode_into(&first, &mut wire).expect("encode first");
    encode_into(&second, &mut wire).expect("encode second");

    assert_eq!(decode_all(&wire), [first, second]);
}

#[test]
fn header_split_across_chunks_is_buffered() {
    let wire = encode(&TextResponse::new(StatusCode::Ok).with_body("ok").into())
        .expect("encode response");
    let mut framer = framer();
    let mut frames = Vec::new();
    for chunk in wire.chunks(3) {
        let fed = framer.feed(chunk);
        assert!(fed.error.is_none());
        frames.extend(fed.frames);
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_bytes(), &wire[..]);
}

#[test]
fn rule_reports_body_length() {
    let parsed = TextRule::default()
        .parse_header(b"V GET /\ncontent-length: 7\n\n")
        .expect("valid header")
        .expect("complete header");
    assert_eq!(parsed.body, BodyLength::Exact(7));
    assert_eq!(parsed.header_len, 27);
    assert_eq!(parsed.header.content_length, Some(7));
}

#[rstest]
#[case::no_colon(&b"V GET /\nbroken\n\n"[..])]
#[case::empty_name(&b"V GET /\n: value\n\n"[..])]
#[case::empty_start_line(&b"\n\n"[..])]
#[case::not_utf8(&b"V GET \xff\n\n"[..])]
fn malformed_sections_discard_buffer(#[case] bytes: &[u8]) {
    let mut framer = framer();
    let fed = framer.feed(bytes);
    assert!(fed.frames.is_empty());
    assert!(matches!(
        fed.error,
        Some(FramingError::MalformedHeader { .. })
    ));
    assert_eq!(framer.buffered_len(), 0);
}

#[test]
fn bad_content_length_is_invalid_length() {
    let fed = framer().feed(b"V GET /\ncontent-length: lots\n\n");
    assert_eq!(
        fed.error,
        Some(FramingError::InvalidLength {
            value: "lots".to_owned()
        })
    );
}

#[test]
fn unterminated_header_section_is_capped() {
    let mut framer = Framer::new(TextRule::new(16), 4096);
    assert!(framer.feed(b"V GET /0123456").error.is_none());
    let fed = framer.feed(b"789abcdef");
    assert_eq!(fed.error, Some(FramingError::HeaderTooLong { limit: 16 }));
}

#[rstest]
#[case::two_tokens("V GET")]
#[case::unknown_token("V FETCH /x")]
#[case::four_digit_status("V 2000 OK")]
fn invalid_start_lines_are_protocol_errors(#[case] line: &str) {
    let fed = framer().feed(format!("{line}\n\n").as_bytes());
    let frame = fed.frames.first().expect("frame");
    assert!(matches!(
        decode(frame),
        Err(ProtocolError::InvalidStartLine { .. })
    ));
}

#[test]
fn unknown_numeric_status_is_reported() {
    let fed = framer().feed(b"V 299 Odd\n\n");
    let frame = fed.frames.first().expect("frame");
    assert_eq!(
        decode(frame),
        Err(ProtocolError::UnknownStatus { code: 299 })
    );
}

#[rstest]
#[case::colon_in_name("a:b", "v")]
#[case::newline_in_value("a", "v\nw")]
#[case::padded_value("a", " v")]
#[case::explicit_length("Content-Length", "3")]
fn unrepresentable_headers_are_rejected(#[case] name: &str, #[case] value: &str) {
    let request = TextRequest::new(Method::Get, "/").with_header(name, value);
    assert!(matches!(
        encode(&request.into()),
        Err(ProtocolError::InvalidHeaderLine { .. })
    ));
}

#[test]
fn newline_in_path_is_rejected() {
    let request = TextRequest::new(Method::Get, "/a\nb");
    assert!(matches!(
        encode(&request.into()),
        Err(ProtocolError::InvalidStartLine { .. })
    ));
}

#[test]
fn codec_round_trips_through_buffer() {
    let mut codec = TextCodec::default();
    let message = TextMessage::from(
        TextRequest::new(Method::Delete, "/sensors/3")
            .with_header("X-Reason", "retired")
            .with_body(vec![0_u8, 1, 2]),
    );
    let mut buf = BytesMut::new();
    codec
        .encode(message.clone(), &mut buf)
        .expect("encode message");
    let decoded = codec
        .decode(&mut buf)
        .expect("decode message")
        .expect("complete message");
    assert_eq!(decoded, message);
    assert!(buf.is_empty());
}

#[test]
fn codec_encoder_enforces_max_frame_length() {
    let mut codec = TextCodec::new(64, DEFAULT_MAX_HEADER_LENGTH);
    let message = TextMessage::from(TextResponse::new(StatusCode::Ok).with_body(vec![b'x'; 64]));
    let mut buf = BytesMut::new();
    assert!(matches!(
        codec.encode(message, &mut buf),
        Err(CodecError::Framing(FramingError::OversizedFrame { max: 64, .. }))
    ));
    assert!(buf.is_empty());
}
