// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step driver (§4.E): lifecycle of one step container.

use std::sync::Arc;

use vela_core::{Container, StepRecord};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::driver::{stream_container, LogTarget};
use crate::engine::Engine;
use crate::env::{apply_default_environment, substitute_environment};
use crate::error::EngineError;
use crate::secrets::inject_secrets;
use crate::snapshot::{snapshot_step, upload_step};

impl<R, C, S> Engine<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    /// Prepares a step container for execution: default environment,
    /// `SetupContainer`, secret injection, then `${VAR}` substitution
    /// (§4.E). Rejects `name == "init"` — the init step has no container
    /// of its own.
    pub async fn create_step(&self, container: &mut Container) -> Result<(), EngineError> {
        if container.is_init() {
            return Err(EngineError::Validation(
                "step \"init\" has no container".to_string(),
            ));
        }
        let distribution = self.build.lock().distribution.clone();
        apply_default_environment(container, &self.hostname, self.runtime.driver(), &distribution);
        self.runtime.setup_container(container).await?;
        inject_secrets(container, &self.secrets.read());
        substitute_environment(container);
        let _ = self.prepared.store(container.id.as_str(), container.clone());
        Ok(())
    }

    /// Returns the container as configured by a prior `create_step` (§4.I:
    /// AssembleBuild creates once, later phases reuse the result). Falls
    /// back to running `create_step` itself against a copy of `fallback`
    /// when nothing was prepared — e.g. a caller driving a step directly
    /// without going through AssembleBuild first.
    pub(crate) async fn prepared_step(&self, fallback: &Container) -> Result<Container, EngineError> {
        if let Ok(container) = self.prepared.load(fallback.id.as_str()) {
            return Ok(container);
        }
        let mut container = fallback.clone();
        self.create_step(&mut container).await?;
        Ok(container)
    }

    /// Plans a step: a fresh `running` record pushed to the control plane,
    /// and an empty log record fetched and stored (§4.E). `container.number
    /// == 0` is rejected.
    pub async fn plan_step(&self, container: &Container) -> Result<StepRecord, EngineError> {
        if container.number == 0 {
            return Err(EngineError::Validation(
                "step number must be >= 1".to_string(),
            ));
        }
        let now = self.clock.now();
        let record = StepRecord::planned(container.id.clone(), &container.name, container.number, now);
        let record = match &self.client {
            Some(client) => client.update_step(&record).await?,
            None => record,
        };
        self.step_records.store(container.id.as_str(), record.clone())?;

        let log = match &self.client {
            Some(client) => client
                .get_step_log(container.id.as_str())
                .await
                .unwrap_or_else(|_| vela_core::LogRecord::new(container.id.as_str())),
            None => vela_core::LogRecord::new(container.id.as_str()),
        };
        self.step_logs.store(container.id.as_str(), log)?;
        Ok(record)
    }

    /// Runs a step's container, streaming its output for the duration of
    /// the run; unless detached, waits for exit, inspects, and snapshots
    /// the record (§4.E). Skips `name == "init"`.
    pub async fn exec_step(self: &Arc<Self>, container: Container) -> Result<(), EngineError> {
        if container.is_init() {
            return Ok(());
        }
        self.runtime.run_container(&container, &self.pipeline).await?;

        let streamer = {
            let engine = Arc::clone(self);
            let streamed = container.clone();
            tokio::spawn(async move { engine.stream_step(&streamed).await })
        };

        if container.detach {
            return Ok(());
        }

        self.runtime.wait_container(&container).await?;
        let mut inspected = container.clone();
        let inspect_result = self.runtime.inspect_container(&mut inspected).await;

        match streamer.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(step = %container.id, error = %err, "step log streamer failed"),
            Err(join_err) => tracing::warn!(step = %container.id, error = %join_err, "step log streamer task panicked"),
        }

        inspect_result?;
        snapshot_step(
            container.id.as_str(),
            &self.step_records,
            &inspected,
            self.clock.as_ref(),
            self.client.as_ref(),
        )
        .await
    }

    /// Tails a step container's output into its own log record (§4.E
    /// StreamStep). Exposed directly (not just via `exec_step`'s spawned
    /// task) so cancellation can be exercised without threading through
    /// the whole run/wait/inspect sequence.
    pub async fn stream_step(&self, container: &Container) -> Result<(), EngineError> {
        stream_container(
            self,
            container,
            container.id.as_str(),
            &self.step_logs,
            LogTarget::Step,
        )
        .await
    }

    /// Loads (or defensively creates) the step record, inspects then
    /// removes the container, and always uploads the record regardless of
    /// whether inspect/remove failed (§4.E DestroyStep: "the step record is
    /// still uploaded via the deferred Upload"). Skips `name == "init"`.
    pub async fn destroy_step(&self, container: &Container) -> Result<(), EngineError> {
        if container.is_init() {
            return Ok(());
        }
        if self.step_records.load(container.id.as_str()).is_err() {
            let pending = StepRecord::pending(container.id.clone(), &container.name, container.number);
            self.step_records.store(container.id.as_str(), pending)?;
        }

        let mut inspected = container.clone();
        let result: Result<(), EngineError> = async {
            self.runtime.inspect_container(&mut inspected).await?;
            self.runtime.remove_container(&inspected).await?;
            Ok(())
        }
        .await;

        let upload = upload_step(
            container.id.as_str(),
            &self.step_records,
            &inspected,
            self.clock.as_ref(),
            self.client.as_ref(),
        )
        .await;

        result?;
        upload
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
