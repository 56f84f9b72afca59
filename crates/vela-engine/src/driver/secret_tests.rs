// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use vela_core::test_support::{init_step, step};
use vela_core::{Build, BuildId, BuildStatus, Pipeline, RecordStatus, Secret, SecretEngine, SecretType};
use vela_runtime::{FakeContainerRuntime, FakeProcessSignaler, FakeVelaClient};

use crate::engine::Engine;
use crate::factory::EngineBuilder;
use crate::secrets::RepoContext;

type TestEngine = Engine<FakeContainerRuntime, FakeVelaClient, FakeProcessSignaler>;

fn plugin_secret(name: &str, continue_on_failure: bool) -> Secret {
    let mut origin = step(name, name, 1, "vela/vault-plugin:latest").container;
    origin.ruleset.continue_on_failure = continue_on_failure;
    Secret {
        name: name.to_string(),
        engine: SecretEngine::Native,
        kind: SecretType::Repo,
        key: String::new(),
        value: String::new(),
        images: Vec::new(),
        events: Vec::new(),
        origin: Some(origin),
    }
}

fn pipeline_with_plugin_secrets(secrets: Vec<Secret>) -> Pipeline {
    Pipeline {
        id: "p1".to_string(),
        services: Vec::new(),
        steps: vec![init_step()],
        stages: Vec::new(),
        secrets,
    }
}

fn test_engine(secrets: Vec<Secret>) -> TestEngine {
    EngineBuilder::new()
        .with_build(Build::new(BuildId::new("b1")))
        .unwrap()
        .with_pipeline(pipeline_with_plugin_secrets(secrets))
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
        .unwrap()
}

#[tokio::test]
async fn create_and_destroy_plugin_secret_delegate_to_the_step_pattern() {
    let engine = test_engine(vec![plugin_secret("vault", false)]);
    let mut container = step("vault", "vault", 1, "vela/vault-plugin:latest").container;

    engine.create_plugin_secret(&mut container).await.unwrap();
    assert!(engine
        .runtime
        .calls()
        .contains(&vela_runtime::RuntimeCall::SetupContainer("vault".to_string())));

    engine.destroy_plugin_secret(&container).await.unwrap();
    let record = engine.step_records.load("vault").unwrap();
    assert_eq!(record.status, RecordStatus::Killed);
}

#[tokio::test]
async fn exec_plugin_secrets_is_a_no_op_without_an_init_step() {
    let engine = EngineBuilder::new()
        .with_build(Build::new(BuildId::new("b1")))
        .unwrap()
        .with_pipeline(Pipeline {
            id: "p0".to_string(),
            services: Vec::new(),
            steps: Vec::new(),
            stages: Vec::new(),
            secrets: Vec::new(),
        })
        .unwrap()
        .with_repo(RepoContext::new("octo", "repo"))
        .unwrap()
        .with_runtime(FakeContainerRuntime::new())
        .unwrap()
        .with_signaler(FakeProcessSignaler::new())
        .unwrap()
        .with_hostname("worker-1")
        .unwrap()
        .build()
        .unwrap();
    let engine = Arc::new(engine);
    engine.exec_plugin_secrets().await.unwrap();
}

#[tokio::test]
async fn exec_plugin_secrets_folds_output_into_the_init_log() {
    let engine = Arc::new(test_engine(vec![plugin_secret("vault", false)]));
    engine.set_init_step_id(vela_core::ContainerId::new("init"));
    engine
        .step_records
        .store(
            "init",
            vela_core::StepRecord::planned(vela_core::ContainerId::new("init"), "init", 1, 1),
        )
        .unwrap();
    engine.runtime.set_tail_output("vault", b"fetched secrets\n".to_vec());

    engine.exec_plugin_secrets().await.unwrap();

    let log = engine.step_logs.load("init").unwrap();
    assert_eq!(log.data(), b"fetched secrets\n");
    assert_eq!(engine.build_snapshot().status, BuildStatus::Pending);
}

#[tokio::test]
async fn exec_plugin_secrets_fails_the_build_on_non_continuing_exit() {
    let engine = Arc::new(test_engine(vec![plugin_secret("vault", false)]));
    engine.set_init_step_id(vela_core::ContainerId::new("init"));
    engine
        .step_records
        .store(
            "init",
            vela_core::StepRecord::planned(vela_core::ContainerId::new("init"), "init", 1, 1),
        )
        .unwrap();
    engine.runtime.set_exit_code("vault", 1);

    engine.exec_plugin_secrets().await.unwrap();

    assert_eq!(engine.build_snapshot().status, BuildStatus::Failure);
    let record = engine.step_records.load("init").unwrap();
    assert_eq!(record.status, RecordStatus::Failure);
    assert_eq!(record.exit_code, 1);
}

#[tokio::test]
async fn exec_plugin_secrets_continues_past_a_failing_secret_when_ruleset_allows() {
    let engine = Arc::new(test_engine(vec![plugin_secret("vault", true), plugin_secret("other", false)]));
    engine.set_init_step_id(vela_core::ContainerId::new("init"));
    engine
        .step_records
        .store(
            "init",
            vela_core::StepRecord::planned(vela_core::ContainerId::new("init"), "init", 1, 1),
        )
        .unwrap();
    engine.runtime.set_exit_code("vault", 1);

    engine.exec_plugin_secrets().await.unwrap();

    assert_eq!(engine.build_snapshot().status, BuildStatus::Pending);
    assert!(engine
        .runtime
        .calls()
        .contains(&vela_runtime::RuntimeCall::RunContainer("other".to_string())));
}
