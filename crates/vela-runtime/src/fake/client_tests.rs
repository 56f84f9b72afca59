// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use vela_core::{BuildId, ContainerId, RecordStatus};

#[tokio::test]
async fn update_build_records_pushed_builds() {
    let client = FakeVelaClient::new();
    let build = Build::new(BuildId::new("b1"));
    client.update_build(&build).await.unwrap();
    assert_eq!(client.builds().len(), 1);
    assert_eq!(client.last_build().unwrap().id, BuildId::new("b1"));
}

#[tokio::test]
async fn update_step_echoes_record_back() {
    let client = FakeVelaClient::new();
    let record: StepRecord = vela_core::ContainerRecord::planned(
        ContainerId::new("s1"),
        "clone",
        2,
        10,
    );
    let echoed = client.update_step(&record).await.unwrap();
    assert_eq!(echoed.status, RecordStatus::Running);
}

#[tokio::test]
async fn update_step_log_is_retrievable_via_get() {
    let client = FakeVelaClient::new();
    let mut log = LogRecord::new("s1");
    log.append(b"hello");
    client.update_step_log(&log).await.unwrap();
    let fetched = client.get_step_log("s1").await.unwrap();
    assert_eq!(fetched.data(), b"hello");
}

#[tokio::test]
async fn get_secret_resolves_by_composed_path() {
    let client = FakeVelaClient::new();
    client.put_secret(
        "octo/repo/foobar",
        Secret {
            name: "foobar".to_string(),
            engine: SecretEngine::Native,
            kind: SecretType::Repo,
            key: "foobar".to_string(),
            value: "hello".to_string(),
            images: vec![],
            events: vec![],
            origin: None,
        },
    );
    let secret = client
        .get_secret(SecretEngine::Native, SecretType::Repo, "octo", "repo", "foobar")
        .await
        .unwrap();
    assert_eq!(secret.value, "hello");
}

#[tokio::test]
async fn get_secret_missing_returns_not_found() {
    let client = FakeVelaClient::new();
    let err = client
        .get_secret(SecretEngine::Native, SecretType::Repo, "octo", "repo", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn fail_next_injects_error_once() {
    let client = FakeVelaClient::new();
    client.fail_next("update_build", ClientError::Http("boom".to_string()));
    let build = Build::new(BuildId::new("b1"));
    assert!(client.update_build(&build).await.is_err());
    assert!(client.update_build(&build).await.is_ok());
}
