//! Generated checks for SERP encoding and chunked reassembly.

use bytes::Bytes;
use proptest::{
    collection::vec,
    prelude::{Strategy, any, prop_oneof},
    prop_assert,
    prop_assert_eq,
    sample::select,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;

use crate::{
    codec::{
        Header,
        Message,
        MessageId,
        Method,
        PeerId,
        Request,
        Response,
        SerpRule,
        StatusCode,
        decode,
        encode,
    },
    frame::Framer,
};

const MAX_FRAME_LENGTH: usize = 4096;

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn header_strategy() -> impl Strategy<Value = Header> {
    (any::<u32>(), any::<u16>(), any::<u16>()).prop_map(|(id, source, destination)| Header {
        message_id: MessageId::new(id),
        source: PeerId::new(source),
        destination: PeerId::new(destination),
    })
}

fn target_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["(/[a-z0-9-]{1,8}){0,4}", any::<String>()]
}

fn body_strategy() -> impl Strategy<Value = Bytes> {
    vec(any::<u8>(), 0..256).prop_map(Bytes::from)
}

fn message_strategy() -> impl Strategy<Value = Message> {
    let request = (
        header_strategy(),
        select(Method::ALL.to_vec()),
        target_strategy(),
        body_strategy(),
    )
        .prop_map(|(header, method, target, body)| {
            Message::Request(Request {
                header,
                method,
                target,
                body,
            })
        });
    let response = (
        header_strategy(),
        select(StatusCode::ALL.to_vec()),
        body_strategy(),
    )
        .prop_map(|(header, status, body)| {
            Message::Response(Response {
                header,
                status,
                body,
            })
        });
    prop_oneof![request, response]
}

fn encode_case(message: &Message) -> Result<Bytes, TestCaseError> {
    encode(message).map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))
}

#[rstest]
#[case(64)]
#[case(192)]
fn generated_messages_round_trip(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);

    runner
        .run(&message_strategy(), |message| {
            let wire = encode_case(&message)?;
            let mut framer = Framer::new(SerpRule, MAX_FRAME_LENGTH);
            let fed = framer.feed(&wire);

            prop_assert!(fed.error.is_none());
            prop_assert_eq!(fed.frames.len(), 1);
            let decoded = decode(&fed.frames[0])
                .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
            prop_assert_eq!(decoded, message);
            prop_assert_eq!(framer.buffered_len(), 0);
            Ok(())
        })
        .expect("generated messages should round-trip");
}

#[rstest]
#[case(48)]
#[case(128)]
fn generated_streams_survive_arbitrary_chunking(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = (vec(message_strategy(), 1..8), vec(1usize..40, 1..12));

    runner
        .run(&strategy, |(messages, chunk_sizes)| {
            let encoded = messages
                .iter()
                .map(encode_case)
                .collect::<Result<Vec<_>, _>>()?;
            let stream: Vec<u8> = encoded.iter().flat_map(|wire| wire.iter().copied()).collect();

            let mut framer = Framer::new(SerpRule, MAX_FRAME_LENGTH);
            let mut frames = Vec::new();
            let mut rest = stream.as_slice();
            for size in chunk_sizes.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let (chunk, tail) = rest.split_at((*size).min(rest.len()));
                rest = tail;
                let fed = framer.feed(chunk);
                prop_assert!(fed.error.is_none());
                frames.extend(fed.frames);
            }

            prop_assert_eq!(frames.len(), messages.len());
            for ((frame, wire), message) in frames.iter().zip(&encoded).zip(&messages) {
                prop_assert_eq!(frame.as_bytes(), wire.as_ref());
                let decoded = decode(frame)
                    .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
                prop_assert_eq!(&decoded, message);
            }
            prop_assert!(!framer.is_mid_frame());
            Ok(())
        })
        .expect("chunked streams should reassemble");
}
