// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::registry::Registry;
use vela_core::{Build, BuildId, ContainerId, ContainerRecord, FakeClock, StepRecord};
use vela_runtime::FakeVelaClient;

fn container(exit_code: i32) -> Container {
    let mut c = Container::new("c1", "echo", 1);
    c.exit_code = exit_code;
    c
}

#[test]
fn pending_record_is_force_killed() {
    let clock = FakeClock::new(100);
    let mut record: StepRecord = ContainerRecord::pending(ContainerId::new("c1"), "echo", 1);
    infer_terminal_state(&mut record, &container(0), &clock);
    assert_eq!(record.status, vela_core::RecordStatus::Killed);
    assert_eq!(record.exit_code, vela_core::KILLED_EXIT_CODE);
    assert_eq!(record.finished, 100);
    assert_eq!(record.started, 100);
}

#[test]
fn zero_exit_code_infers_success() {
    let clock = FakeClock::new(50);
    let mut record: StepRecord = ContainerRecord::planned(ContainerId::new("c1"), "echo", 1, 10);
    infer_terminal_state(&mut record, &container(0), &clock);
    assert_eq!(record.status, vela_core::RecordStatus::Success);
    assert_eq!(record.finished, 50);
}

#[test]
fn nonzero_exit_code_infers_failure_and_copies_code() {
    let clock = FakeClock::new(50);
    let mut record: StepRecord = ContainerRecord::planned(ContainerId::new("c1"), "echo", 1, 10);
    infer_terminal_state(&mut record, &container(3), &clock);
    assert_eq!(record.status, vela_core::RecordStatus::Failure);
    assert_eq!(record.exit_code, 3);
}

#[test]
fn already_finished_record_is_left_alone() {
    let clock = FakeClock::new(999);
    let mut record: StepRecord = ContainerRecord::planned(ContainerId::new("c1"), "echo", 1, 10);
    record.finished = 20;
    record.status = vela_core::RecordStatus::Success;
    infer_terminal_state(&mut record, &container(1), &clock);
    assert_eq!(record.finished, 20);
    assert_eq!(record.status, vela_core::RecordStatus::Success);
}

#[tokio::test]
async fn snapshot_step_creates_missing_record_and_pushes() {
    let clock = FakeClock::new(5);
    let records: Registry<StepRecord> = Registry::new();
    let client = FakeVelaClient::new();
    let container = container(0);

    snapshot_step("missing", &records, &container, &clock, Some(&client))
        .await
        .unwrap();

    let stored = records.load("missing").unwrap();
    assert_eq!(stored.status, vela_core::RecordStatus::Success);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn snapshot_step_with_no_client_is_local_only() {
    let clock = FakeClock::new(5);
    let records: Registry<StepRecord> = Registry::new();
    let container = container(0);

    snapshot_step::<FakeVelaClient>("missing", &records, &container, &clock, None)
        .await
        .unwrap();

    assert!(records.load("missing").is_ok());
}

#[tokio::test]
async fn upload_build_sets_error_status_when_err_present() {
    let clock = FakeClock::new(5);
    let client = FakeVelaClient::new();
    let mut build = Build::new(BuildId::new("b1"));
    build.status = vela_core::BuildStatus::Running;

    upload_build(
        &mut build,
        Some(&EngineError::Validation("bad step".to_string())),
        &clock,
        Some(&client),
    )
    .await;

    assert_eq!(build.status, vela_core::BuildStatus::Error);
    assert_eq!(build.error.as_deref(), Some("validation error: bad step"));
    assert_eq!(client.builds().len(), 1);
}

#[tokio::test]
async fn upload_build_leaves_success_status_when_no_err() {
    let clock = FakeClock::new(5);
    let client = FakeVelaClient::new();
    let mut build = Build::new(BuildId::new("b1"));
    build.status = vela_core::BuildStatus::Success;

    upload_build(&mut build, None, &clock, Some(&client)).await;

    assert_eq!(build.status, vela_core::BuildStatus::Success);
    assert_eq!(build.error, None);
}
