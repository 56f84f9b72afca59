// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use vela_core::test_support::{basic_steps_pipeline, step};
use vela_core::{Build, BuildId};
use vela_runtime::{FakeContainerRuntime, FakeProcessSignaler, FakeVelaClient};

use super::*;
use crate::factory::EngineBuilder;

type TestEngine = Engine<FakeContainerRuntime, FakeVelaClient, FakeProcessSignaler>;

fn test_engine() -> TestEngine {
    EngineBuilder::new()
        .with_build(Build::new(BuildId::new("b1")))
        .unwrap()
        .with_pipeline(basic_steps_pipeline())
        .unwrap()
        .with_repo(crate::secrets::RepoContext::new("octo", "repo"))
        .unwrap()
        .with_runtime(FakeContainerRuntime::new())
        .unwrap()
        .with_signaler(FakeProcessSignaler::new())
        .unwrap()
        .with_hostname("worker-1")
        .unwrap()
        .with_client(FakeVelaClient::new())
        .unwrap()
        .build()
        .unwrap()
}

#[tokio::test]
async fn stream_container_buffers_small_output_and_flushes_once() {
    let engine = test_engine();
    let container = step("echo", "echo", 3, "alpine:latest").container;
    engine.runtime.set_tail_output("echo", b"line one\nline two\n".to_vec());

    stream_container(&engine, &container, "echo", &engine.step_logs, LogTarget::Step)
        .await
        .unwrap();

    let log = engine.step_logs.load("echo").unwrap();
    assert_eq!(log.data(), b"line one\nline two\n");
}

#[tokio::test]
async fn stream_container_flushes_in_chunks_above_the_threshold() {
    let engine = test_engine();
    let container = step("echo", "echo", 3, "alpine:latest").container;
    let big = vec![b'x'; STREAM_FLUSH_BYTES * 2 + 10];
    engine.runtime.set_tail_output("echo", big.clone());

    stream_container(&engine, &container, "echo", &engine.step_logs, LogTarget::Step)
        .await
        .unwrap();

    // The final re-read overwrites with the full output regardless of how
    // many chunked flushes preceded it (§4.E "final consistency" pass).
    let log = engine.step_logs.load("echo").unwrap();
    assert_eq!(log.data(), big.as_slice());
}

#[tokio::test]
async fn stream_container_is_cancellable() {
    let engine = test_engine();
    let container = step("echo", "echo", 3, "alpine:latest").container;
    engine.cancel_token().cancel();

    let result = tokio::time::timeout(
        Duration::from_millis(200),
        stream_container(&engine, &container, "echo", &engine.step_logs, LogTarget::Step),
    )
    .await
    .expect("stream_container should return promptly once cancelled");

    assert!(matches!(result, Err(EngineError::Cancelled)));
}

#[tokio::test]
async fn stream_container_empty_output_still_creates_the_log() {
    let engine = test_engine();
    let container = step("echo", "echo", 3, "alpine:latest").container;

    stream_container(&engine, &container, "echo", &engine.step_logs, LogTarget::Step)
        .await
        .unwrap();

    let log = engine.step_logs.load("echo").unwrap();
    assert!(log.is_empty());
}
