// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use vela_core::test_support::{basic_steps_pipeline, init_step, step};
use vela_core::{Build, BuildId, BuildStatus, Pipeline, RecordStatus, Secret, SecretEngine, SecretType};
use vela_runtime::{FakeContainerRuntime, FakeProcessSignaler, FakeVelaClient};

use super::*;
use crate::factory::EngineBuilder;
use crate::secrets::RepoContext;

type TestEngine = Engine<FakeContainerRuntime, FakeVelaClient, FakeProcessSignaler>;

fn engine_for(pipeline: Pipeline) -> Arc<TestEngine> {
    Arc::new(
        EngineBuilder::new()
            .with_build(Build::new(BuildId::new("b1")))
            .unwrap()
            .with_pipeline(pipeline)
            .unwrap()
            .with_repo(RepoContext::new("octo", "repo"))
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
            .unwrap(),
    )
}

fn foobar_secret_on_client(engine: &TestEngine) {
    engine.client.as_ref().unwrap().put_secret(
        "octo/repo/foobar",
        Secret {
            name: "foobar".to_string(),
            engine: SecretEngine::Native,
            kind: SecretType::Repo,
            key: "foobar".to_string(),
            value: "hello".to_string(),
            images: Vec::new(),
            events: Vec::new(),
            origin: None,
        },
    );
}

#[tokio::test]
async fn create_build_marks_running_and_resolves_the_init_step() {
    let engine = engine_for(basic_steps_pipeline());
    engine.create_build().await.unwrap();

    assert_eq!(engine.build_snapshot().status, BuildStatus::Running);
    assert_eq!(engine.build_snapshot().host, "worker-1");
    assert_eq!(engine.init_step_id(), Some(vela_core::ContainerId::new("init")));
    assert_eq!(engine.step_records.load("init").unwrap().status, RecordStatus::Running);
    assert!(engine.step_logs.load("init").is_ok());
}

#[tokio::test]
async fn create_build_fails_when_the_pipeline_has_no_steps_or_stages() {
    let engine = engine_for(Pipeline {
        id: "empty".to_string(),
        services: Vec::new(),
        steps: Vec::new(),
        stages: Vec::new(),
        secrets: Vec::new(),
    });

    let err = engine.create_build().await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn plan_build_creates_network_and_volume_and_resolves_secrets() {
    let engine = engine_for(basic_steps_pipeline());
    foobar_secret_on_client(&engine);
    engine.create_build().await.unwrap();

    engine.plan_build().await.unwrap();

    assert!(engine.runtime.calls().contains(&vela_runtime::RuntimeCall::CreateNetwork));
    assert!(engine.runtime.calls().contains(&vela_runtime::RuntimeCall::CreateVolume));
    assert_eq!(engine.secrets.read().get("foobar").map(|s| s.value.as_str()), Some("hello"));

    let log = engine.step_logs.load("init").unwrap();
    let text = String::from_utf8(log.data().to_vec()).unwrap();
    assert!(text.contains("Inspecting runtime network"));
    assert!(text.contains("Inspecting runtime volume"));
    assert!(text.contains("Pulled secret foobar"));
    // Network is inspected before volume, matching phase order (§8 property 7).
    assert!(text.find("network").unwrap() < text.find("volume").unwrap());
}

#[tokio::test]
async fn plan_build_fails_on_an_unrecognized_secret_path() {
    let mut pipeline = basic_steps_pipeline();
    pipeline.secrets[0].key = "acme/api-token".to_string();
    pipeline.secrets[0].kind = SecretType::Shared;
    let engine = engine_for(pipeline);
    engine.create_build().await.unwrap();

    let err = engine.plan_build().await.unwrap_err();
    assert!(matches!(err, EngineError::Secret(_)));
    assert_eq!(engine.build_snapshot().status, BuildStatus::Running);
}

#[tokio::test]
async fn plan_build_awaits_the_build_upload_before_returning() {
    // A failing phase must push a build snapshot with `status = error`
    // before the method returns, not on some detached background task —
    // if the upload were dropped fire-and-forget, this call would often
    // observe no pushed build at all.
    let mut pipeline = basic_steps_pipeline();
    pipeline.secrets[0].key = "acme/api-token".to_string();
    pipeline.secrets[0].kind = SecretType::Shared;
    let engine = engine_for(pipeline);
    engine.create_build().await.unwrap();

    let client = engine.client.clone().unwrap();
    let builds_before = client.builds().len();

    engine.plan_build().await.unwrap_err();

    let builds = client.builds();
    assert_eq!(builds.len(), builds_before + 1);
    let last = builds.last().unwrap();
    assert_eq!(last.status, BuildStatus::Error);
    assert!(last.error.as_deref().unwrap_or_default().contains("secret"));
}

#[tokio::test]
async fn assemble_build_creates_every_service_and_step_and_inspects_images() {
    let engine = engine_for(basic_steps_pipeline());
    foobar_secret_on_client(&engine);
    engine.create_build().await.unwrap();
    engine.plan_build().await.unwrap();

    engine.assemble_build().await.unwrap();

    let calls = engine.runtime.calls();
    assert!(calls.contains(&vela_runtime::RuntimeCall::SetupContainer("postgres".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::SetupContainer("clone".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::SetupContainer("echo".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::InspectImage("postgres".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::InspectImage("echo".to_string())));

    let log = engine.step_logs.load("init").unwrap();
    let text = String::from_utf8(log.data().to_vec()).unwrap();
    assert!(text.contains("Pulling service images"));
    assert!(text.contains("Pulling step images"));
}

#[tokio::test]
async fn assemble_build_fails_fast_on_a_missing_image() {
    let engine = engine_for(basic_steps_pipeline());
    foobar_secret_on_client(&engine);
    engine.create_build().await.unwrap();
    engine.plan_build().await.unwrap();
    engine.runtime.mark_image_missing("postgres");

    let err = engine.assemble_build().await.unwrap_err();
    assert!(matches!(err, EngineError::Runtime(_)));
    // A later step is never reached once the service image lookup fails.
    assert!(!engine
        .runtime
        .calls()
        .contains(&vela_runtime::RuntimeCall::SetupContainer("clone".to_string())));
}

#[tokio::test]
async fn full_cycle_steps_pipeline_reaches_success() {
    let engine = engine_for(basic_steps_pipeline());
    foobar_secret_on_client(&engine);

    engine.create_build().await.unwrap();
    engine.plan_build().await.unwrap();
    engine.assemble_build().await.unwrap();
    engine.exec_build().await.unwrap();

    assert_eq!(engine.build_snapshot().status, BuildStatus::Success);
    assert_eq!(engine.step_records.load("clone").unwrap().status, RecordStatus::Success);
    assert_eq!(engine.step_records.load("echo").unwrap().status, RecordStatus::Success);
    // Services stay `running` until Destroy finalizes them — they are
    // long-lived sidecars, not short-lived like steps (§4.F).
    assert_eq!(engine.service_records.load("postgres").unwrap().status, RecordStatus::Running);

    // §8 "Steps pipeline, basic success": the resolved secret is injected
    // into echo's environment and `${FOOBAR}` is substituted in its
    // command, using the exact container AssembleBuild configured.
    let echo = engine.prepared.load("echo").unwrap();
    assert_eq!(echo.environment.get("FOOBAR").map(String::as_str), Some("hello"));
    assert_eq!(echo.commands, vec!["echo hello".to_string()]);
}

#[tokio::test]
async fn exec_build_fails_the_build_when_a_non_continuing_step_exits_nonzero() {
    let engine = engine_for(basic_steps_pipeline());
    foobar_secret_on_client(&engine);
    engine.create_build().await.unwrap();
    engine.plan_build().await.unwrap();
    engine.assemble_build().await.unwrap();
    engine.runtime.set_exit_code("echo", 1);

    let err = engine.exec_build().await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(engine.build_snapshot().status, BuildStatus::Failure);
}

#[tokio::test]
async fn destroy_build_is_best_effort_and_returns_the_last_error() {
    let pipeline = Pipeline {
        id: "p-destroy".to_string(),
        services: vec![vela_core::test_support::service("db", "db", 1, "postgres:13")],
        steps: vec![
            init_step(),
            step("a", "a", 2, "alpine:latest"),
            step("b", "b", 3, "alpine:latest"),
        ],
        stages: Vec::new(),
        secrets: Vec::new(),
    };
    let engine = engine_for(pipeline);

    engine.runtime.mark_container_missing("a");

    let err = engine.destroy_build().await.unwrap_err();
    assert!(matches!(err, EngineError::Runtime(_)));

    // Every sub-destroy still ran despite "a" failing.
    let calls = engine.runtime.calls();
    assert!(calls.contains(&vela_runtime::RuntimeCall::RemoveContainer("b".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::RemoveContainer("db".to_string())));
    assert!(calls.contains(&vela_runtime::RuntimeCall::RemoveVolume));
    assert!(calls.contains(&vela_runtime::RuntimeCall::RemoveNetwork));
    // The init step is never destroyed.
    assert!(!calls.contains(&vela_runtime::RuntimeCall::RemoveContainer("init".to_string())));
}

#[tokio::test]
async fn cancel_build_marks_non_success_records_canceled_and_sends_sigterm() {
    let engine = engine_for(basic_steps_pipeline());
    let echo_container = step("echo", "echo", 3, "alpine:latest").container;
    engine.plan_step(&echo_container).await.unwrap();

    let clone_container = step("clone", "clone", 2, "alpine:latest").container;
    engine.plan_step(&clone_container).await.unwrap();
    {
        let mut done = engine.step_records.load("clone").unwrap();
        done.status = RecordStatus::Success;
        engine.step_records.store("clone", done).unwrap();
    }

    engine.cancel_build().await.unwrap();

    assert_eq!(engine.build_snapshot().status, BuildStatus::Canceled);
    assert_eq!(engine.step_records.load("echo").unwrap().status, RecordStatus::Canceled);
    assert_eq!(engine.step_records.load("clone").unwrap().status, RecordStatus::Success);
    assert!(engine.is_cancelled());
    assert_eq!(engine.signaler.sigterm_count(), 1);
}
