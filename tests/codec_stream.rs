//! The binary and text codecs driven through `tokio_util` framed streams.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serp::{
    CodecError,
    Message,
    Method,
    PeerId,
    Request,
    Response,
    SerpCodec,
    StatusCode,
    codec::EofError,
    text::{TextCodec, TextMessage, TextRequest, TextResponse},
};
use serp_testing::encode_all;
use tokio::io::{AsyncWriteExt, duplex};
use tokio_util::codec::{FramedRead, FramedWrite};

fn sample_messages() -> Vec<Message> {
    vec![
        Request::new(Method::Post, "/jobs")
            .to(PeerId::new(2))
            .with_body("payload")
            .into(),
        Response::new(StatusCode::NoContent).into(),
        Request::new(Method::Disconnect, "/").into(),
    ]
}

#[tokio::test]
async fn binary_messages_cross_a_duplex_stream() {
    let (client, server) = duplex(7);
    let mut writer = FramedWrite::new(client, SerpCodec::default());
    let mut reader = FramedRead::new(server, SerpCodec::default());

    let messages = sample_messages();
    let expected = messages.clone();
    let send = tokio::spawn(async move {
        for message in messages {
            writer.send(message).await.expect("send");
        }
    });

    let mut received = Vec::new();
    for _ in 0..expected.len() {
        received.push(reader.next().await.expect("stream open").expect("decode"));
    }
    send.await.expect("writer task");
    assert_eq!(received, expected);
}

#[tokio::test]
async fn truncated_binary_stream_reports_eof() {
    let wire = encode_all(sample_messages());
    let truncated = wire.slice(..wire.len() - 1);
    let mut reader = FramedRead::new(&truncated[..], SerpCodec::default());

    assert!(reader.next().await.expect("first").is_ok());
    assert!(reader.next().await.expect("second").is_ok());
    let err = reader.next().await.expect("third").expect_err("truncated");
    assert!(matches!(err, CodecError::Eof(EofError::MidFrame { .. })), "{err}");
}

#[tokio::test]
async fn oversized_message_is_refused_by_encoder() {
    let (client, _server) = duplex(64);
    let mut writer = FramedWrite::new(client, SerpCodec::new(64));
    let err = writer
        .send(Request::new(Method::Put, "/big").with_body(vec![0_u8; 64]).into())
        .await
        .expect_err("too large");
    assert!(err.to_string().contains("frame exceeds max length"), "{err}");
}

#[tokio::test]
async fn text_messages_cross_a_duplex_stream() {
    let (mut client, server) = duplex(64);
    let mut reader = FramedRead::new(server, TextCodec::default());
    let writer = tokio::spawn(async move {
        client
            .write_all(b"SERP/1.0 PUT /lights/hall\r\nContent-Length: 2\r\nX-Room: hall\r\n\r\non")
            .await
            .expect("write");
        client
            .write_all(b"SERP/1.0 200 OK\ncontent-length: 0\n\n")
            .await
            .expect("write");
    });

    let TextMessage::Request(request) = reader.next().await.expect("first").expect("decode") else {
        panic!("expected a request");
    };
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/lights/hall");
    assert_eq!(request.header("x-room"), Some("hall"));
    assert_eq!(request.body, Bytes::from_static(b"on"));

    let TextMessage::Response(response) = reader.next().await.expect("second").expect("decode")
    else {
        panic!("expected a response");
    };
    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_empty());
    writer.await.expect("writer task");
}

#[tokio::test]
async fn text_codec_round_trips_through_sink() {
    let (client, server) = duplex(1024);
    let mut writer = FramedWrite::new(client, TextCodec::default());
    let mut reader = FramedRead::new(server, TextCodec::default());

    let messages: Vec<TextMessage> = vec![
        TextRequest::new(Method::Get, "/status")
            .with_header("accept", "text/plain")
            .into(),
        TextResponse::new(StatusCode::NotFound)
            .with_body("missing")
            .into(),
    ];
    for message in messages.clone() {
        writer.send(message).await.expect("send");
    }
    for expected in messages {
        assert_eq!(reader.next().await.expect("open").expect("decode"), expected);
    }
}
