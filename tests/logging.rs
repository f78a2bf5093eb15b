//! Diagnostics the engine logs for recovered failures.
//!
//! Records are captured through the `log` bridge with `logtest`, so these
//! tests share one global logger and run serially.

mod common;

use std::time::Duration;

use common::{LOCAL, REMOTE, inbound};
use log::Level;
use rstest::rstest;
use serial_test::serial;
use serp::{EngineConfig, Method, Request, Response, RetryPolicy, StatusCode};
use serp_testing::{LoggerHandle, connected_pair, engine_pair, logger};

fn assert_logged(messages: &[String], needle: &str) {
    assert!(
        messages.iter().any(|message| message.contains(needle)),
        "missing log containing {needle:?}: {messages:?}"
    );
}

#[rstest]
#[serial]
fn unmatched_response_is_warned(mut logger: LoggerHandle) {
    let (mut engine, mut peer) = connected_pair(LOCAL);
    let mut stray = Response::new(StatusCode::Conflict);
    stray.header.message_id = 404.into();
    stray.header.source = REMOTE;
    peer.send(stray);
    engine.tick(Duration::ZERO);

    assert_logged(
        &logger.messages_at(Level::Warn),
        "unmatched response discarded: message_id=404, source=9, status=409 Conflict",
    );
}

#[rstest]
#[serial]
fn routing_miss_is_warned(mut logger: LoggerHandle) {
    let (mut engine, mut peer) = connected_pair(LOCAL);
    peer.send(inbound(Method::Put, "/nope", 1));
    engine.tick(Duration::ZERO);

    assert_logged(
        &logger.messages_at(Level::Warn),
        "no route for request: method=PUT, target=/nope, source=9",
    );
}

#[rstest]
#[serial]
fn timeout_is_warned(mut logger: LoggerHandle) {
    let (mut engine, _peer) = connected_pair(LOCAL);
    let pending = engine
        .send_request(
            Request::new(Method::Get, "/slow").to(REMOTE),
            RetryPolicy::new(Duration::from_secs(1)).with_retries(0),
        )
        .expect("send");
    engine.tick(Duration::from_secs(1));

    assert_logged(
        &logger.messages_at(Level::Warn),
        &format!(
            "request timed out: message_id={}, target=/slow, destination=9",
            pending.message_id()
        ),
    );
}

#[rstest]
#[serial]
fn framing_error_is_warned(mut logger: LoggerHandle) {
    let (mut engine, mut peer) = connected_pair(LOCAL);
    peer.send_raw(&[0, 0, 0, 1, 0, 9, 0, 5, 0, 0, 0, 0, 0xee]);
    engine.tick(Duration::ZERO);

    assert_logged(
        &logger.messages_at(Level::Warn),
        "framing error, discarding buffered bytes: error=unknown message kind: 0xee",
    );
}

#[rstest]
#[serial]
fn handshake_completion_is_logged(mut logger: LoggerHandle) {
    let (mut engine, mut peer) = engine_pair(EngineConfig::default());
    engine.connect().expect("start");
    let [request] = peer.requests().try_into().expect("id request");
    peer.send(Response::reply_to(&request, StatusCode::Ok).with_body("12"));
    engine.tick(Duration::ZERO);

    assert_logged(&logger.messages_at(Level::Info), "handshake complete: local_id=12");
}
