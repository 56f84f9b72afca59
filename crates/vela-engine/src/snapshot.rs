// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot/Upload (§4.B): the deferred finalization every driver runs at
//! the end of (or mid-way through) a container's lifecycle. Both read the
//! record's current state, infer a terminal status from it, and push
//! best-effort to the control plane — never panicking on a missing client,
//! and never propagating a push failure (§7: "logged-and-ignored during
//! Destroy and during log uploads").

use tracing::warn;
use vela_core::{Build, BuildStatus, Clock, Container, RecordKind, RecordStatus, KILLED_EXIT_CODE};
use vela_runtime::VelaClient;

use crate::error::EngineError;

/// Infers a terminal status for `record` given the container's observed
/// `exit_code` (§8 properties 3 and 4):
///
/// - still `pending` ⇒ forced `killed`, `exit_code = 137`.
/// - otherwise, if not yet `finished` ⇒ `success` unless the container
///   exited non-zero, in which case `failure` and the exit code is copied.
pub fn infer_terminal_state<K: RecordKind>(
    record: &mut vela_core::ContainerRecord<K>,
    container: &Container,
    clock: &dyn Clock,
) {
    if record.status == RecordStatus::Pending {
        record.exit_code = KILLED_EXIT_CODE;
        record.finished = clock.now();
        record.status = RecordStatus::Killed;
    }
    if record.started == 0 {
        record.started = record.finished;
    }
    if record.finished == 0 {
        record.finished = clock.now();
        record.status = RecordStatus::Success;
        if container.exit_code > 0 {
            record.status = RecordStatus::Failure;
            record.exit_code = container.exit_code;
        }
    }
}

/// Snapshot (mid-lifecycle) or Upload (end-of-lifecycle) a step record:
/// infer terminal state, persist it, and push best-effort. Steps/services
/// don't distinguish the two calls beyond when they're invoked, so both
/// names share this implementation; only the build-level upload (below)
/// differs.
pub async fn snapshot_step<C: VelaClient>(
    step_id: &str,
    records: &crate::registry::Registry<vela_core::StepRecord>,
    container: &Container,
    clock: &dyn Clock,
    client: Option<&C>,
) -> Result<(), EngineError> {
    let mut record = records
        .load(step_id)
        .unwrap_or_else(|_| vela_core::ContainerRecord::pending(container.id.clone(), &container.name, container.number));
    infer_terminal_state(&mut record, container, clock);
    records.store(step_id, record.clone())?;
    if let Some(client) = client {
        if let Err(err) = client.update_step(&record).await {
            warn!(step = step_id, error = %err, "failed to push step snapshot");
        }
    }
    Ok(())
}

/// Same contract as [`snapshot_step`] for the end-of-lifecycle call site.
pub async fn upload_step<C: VelaClient>(
    step_id: &str,
    records: &crate::registry::Registry<vela_core::StepRecord>,
    container: &Container,
    clock: &dyn Clock,
    client: Option<&C>,
) -> Result<(), EngineError> {
    snapshot_step(step_id, records, container, clock, client).await
}

/// Snapshot (mid-lifecycle) or Upload (end-of-lifecycle) a service record.
pub async fn snapshot_service<C: VelaClient>(
    service_id: &str,
    records: &crate::registry::Registry<vela_core::ServiceRecord>,
    container: &Container,
    clock: &dyn Clock,
    client: Option<&C>,
) -> Result<(), EngineError> {
    let mut record = records
        .load(service_id)
        .unwrap_or_else(|_| vela_core::ContainerRecord::pending(container.id.clone(), &container.name, container.number));
    infer_terminal_state(&mut record, container, clock);
    records.store(service_id, record.clone())?;
    if let Some(client) = client {
        if let Err(err) = client.update_service(&record).await {
            warn!(service = service_id, error = %err, "failed to push service snapshot");
        }
    }
    Ok(())
}

/// Same contract as [`snapshot_service`] for the end-of-lifecycle call site.
pub async fn upload_service<C: VelaClient>(
    service_id: &str,
    records: &crate::registry::Registry<vela_core::ServiceRecord>,
    container: &Container,
    clock: &dyn Clock,
    client: Option<&C>,
) -> Result<(), EngineError> {
    snapshot_service(service_id, records, container, clock, client).await
}

/// Uploads the build record. If `err` is non-nil, sets `status = error`
/// and writes the `error` field (distinct from a pipeline-originated
/// `status = failure`) before pushing — this is the deferred action every
/// orchestrator phase runs on exit so partial progress always reaches the
/// control plane.
pub async fn upload_build<C: VelaClient>(
    build: &mut Build,
    err: Option<&EngineError>,
    clock: &dyn Clock,
    client: Option<&C>,
) {
    if let Some(err) = err {
        build.status = BuildStatus::Error;
        build.error = Some(err.to_string());
    }
    if build.finished == 0 && build.status.is_terminal() {
        build.finished = clock.now();
    }
    if let Some(client) = client {
        if let Err(push_err) = client.update_build(build).await {
            warn!(build = %build.id, error = %push_err, "failed to push build snapshot");
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
