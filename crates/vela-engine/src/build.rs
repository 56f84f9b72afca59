// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build orchestrator (§4.I): the five phases (`create`, `plan`, `assemble`,
//! `exec`, `destroy`) plus the public `cancel` operation. Each phase pushes
//! a build snapshot on exit via [`Engine::upload_build_exit`], standing in
//! for Go's `defer Upload(...)`. Rust has no native `defer` and no async
//! `Drop`, so every phase method is split into a `*_inner` body plus a
//! thin wrapper that awaits the exit upload after the body returns,
//! regardless of which of the body's return points was taken.

use std::sync::Arc;

use vela_core::{BuildStatus, RecordStatus};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::scheduler::run_stages;
use crate::secrets::resolve_secret;
use crate::snapshot::upload_build;

/// Appends one progress line to the init step's log and immediately
/// uploads both the step record and its log, best-effort (§4.I PlanBuild/
/// AssembleBuild, §8 property 7 "init-log aggregation").
async fn note_init_progress<R, C, S>(engine: &Engine<R, C, S>, line: &str)
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    engine.append_init_log(line);
    let Some(init_id) = engine.init_step_id() else {
        return;
    };
    if let Some(client) = engine.client.as_ref() {
        if let Ok(log) = engine.step_logs.load(init_id.as_str()) {
            if let Err(err) = client.update_step_log(&log).await {
                tracing::warn!(step = %init_id, error = %err, "failed to push init log progress line");
            }
        }
    }
}

impl<R, C, S> Engine<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    /// Pushes the build's current snapshot, converting `engine.err` into
    /// `status = error` on the way (§4.I: "a deferred build-snapshot runs
    /// on exit of each phase"). Every phase method below awaits this
    /// directly after its body returns, in place of Go's
    /// `defer Upload(...)` — Rust has no async `Drop`, so there is no way
    /// to run an awaited action on scope exit other than calling it
    /// explicitly at every return point, which is what splitting each
    /// phase into a `*_inner` body plus this tail call achieves.
    async fn upload_build_exit(&self) {
        let err = self.take_err();
        let mut build = self.build.lock().clone();
        upload_build(&mut build, err.as_ref(), self.clock.as_ref(), self.client.as_ref()).await;
    }

    /// CreateBuild (§4.I.1): marks the build `running`, resolves the init
    /// container, creates and plans its step so the init log exists for
    /// subsequent phases to append to.
    pub async fn create_build(&self) -> Result<(), EngineError> {
        let result = self.create_build_inner().await;
        self.upload_build_exit().await;
        result
    }

    async fn create_build_inner(&self) -> Result<(), EngineError> {
        let now = self.clock.now();
        {
            let mut build = self.build.lock();
            build.status = BuildStatus::Running;
            build.started = now;
            build.host = self.hostname.clone();
            build.runtime = self.runtime.driver().to_string();
            build.distribution = build.runtime.clone();
        }

        let Some(init_step) = self.pipeline.init_step() else {
            let err = EngineError::Validation("pipeline has no init container".to_string());
            self.record_err(err.clone());
            return Err(err);
        };
        let mut init_container = init_step.container.clone();
        self.set_init_step_id(init_container.id.clone());

        // The init container has no runnable container of its own
        // (`create_step` rejects `name == "init"`), so its setup is
        // inlined here rather than delegated.
        let result: Result<(), EngineError> = async {
            let distribution = self.build.lock().distribution.clone();
            crate::env::apply_default_environment(
                &mut init_container,
                &self.hostname,
                self.runtime.driver(),
                &distribution,
            );
            self.runtime.setup_container(&init_container).await?;
            crate::secrets::inject_secrets(&mut init_container, &self.secrets.read());
            crate::env::substitute_environment(&mut init_container);
            self.plan_step(&init_container).await?;
            Ok(())
        }
        .await;

        if let Err(err) = &result {
            self.record_err(err.clone());
        }
        result
    }

    /// PlanBuild (§4.I.2): creates the runtime network/volume, resolves
    /// non-plugin secrets, appending a progress summary to the init log
    /// after each.
    pub async fn plan_build(&self) -> Result<(), EngineError> {
        let result = self.plan_build_inner().await;
        self.upload_build_exit().await;
        result
    }

    async fn plan_build_inner(&self) -> Result<(), EngineError> {
        let result: Result<(), EngineError> = async {
            self.runtime.create_network(&self.pipeline).await?;
            self.runtime.inspect_network(&self.pipeline).await?;
            note_init_progress(self, "Inspecting runtime network").await;

            self.runtime.create_volume(&self.pipeline).await?;
            self.runtime.inspect_volume(&self.pipeline).await?;
            note_init_progress(self, "Inspecting runtime volume").await;

            for secret in self.pipeline.fetchable_secrets() {
                let resolved = resolve_secret(secret, &self.repo, self.client_or_err()?).await?;
                self.secrets.write().insert(resolved.name.clone(), resolved.clone());
                note_init_progress(self, &format!("Pulled secret {}", resolved.name)).await;
            }
            Ok(())
        }
        .await;

        self.finish_phase(result).await
    }

    /// AssembleBuild (§4.I.3): creates every service/step/plugin-secret
    /// container and pulls/inspects each image, then runs the plugin
    /// secrets (§4.G).
    pub async fn assemble_build(self: &Arc<Self>) -> Result<(), EngineError> {
        let result = self.assemble_build_inner().await;
        self.upload_build_exit().await;
        result
    }

    async fn assemble_build_inner(self: &Arc<Self>) -> Result<(), EngineError> {
        let result: Result<(), EngineError> = async {
            for service in &self.pipeline.services {
                let mut container = service.container.clone();
                self.create_service(&mut container).await?;
                self.runtime.inspect_image(&container).await?;
                note_init_progress(self, "Pulling service images").await;
            }

            for stage in self.pipeline.non_init_stages() {
                for step in &stage.steps {
                    let mut container = step.container.clone();
                    self.create_step(&mut container).await?;
                    self.runtime.inspect_image(&container).await?;
                }
            }
            for step in self.pipeline.non_init_steps() {
                let mut container = step.container.clone();
                self.create_step(&mut container).await?;
                self.runtime.inspect_image(&container).await?;
                note_init_progress(self, "Pulling step images").await;
            }

            for secret in self.pipeline.plugin_secrets() {
                if let Some(origin) = &secret.origin {
                    let mut container = origin.clone();
                    self.create_step(&mut container).await?;
                    self.runtime.inspect_image(&container).await?;
                }
            }

            self.exec_plugin_secrets().await?;
            Ok(())
        }
        .await;

        self.finish_phase(result).await
    }

    /// ExecBuild (§4.I.4): plans/execs every service in the background,
    /// runs non-init flat steps sequentially with rule evaluation, and
    /// launches the stage scheduler for non-init stages. The first error
    /// from either path returns immediately.
    pub async fn exec_build(self: &Arc<Self>) -> Result<(), EngineError> {
        let result = self.exec_build_inner().await;
        self.upload_build_exit().await;
        result
    }

    async fn exec_build_inner(self: &Arc<Self>) -> Result<(), EngineError> {
        let result: Result<(), EngineError> = async {
            for service in &self.pipeline.services {
                let container = self.prepared_service(&service.container).await?;
                let record = self.plan_service(&container).await?;
                let _ = record;
                self.exec_service(container).await?;
            }

            for step in self.pipeline.non_init_steps() {
                let rule_data = self.rule_data();
                if !step.ruleset.evaluate(&rule_data) {
                    continue;
                }
                let container = self.prepared_step(&step.container).await?;
                self.plan_step(&container).await?;
                self.exec_step(container.clone()).await?;

                if container.detach {
                    continue;
                }
                let record = self.step_records.load(container.id.as_str())?;
                let failed = matches!(record.status, RecordStatus::Failure | RecordStatus::Killed);
                if failed && !step.ruleset.continue_on_failure {
                    self.build.lock().status = BuildStatus::Failure;
                    return Err(EngineError::Validation(format!(
                        "step {} exited {}",
                        step.name, record.exit_code
                    )));
                }
            }

            if self.pipeline.has_stages() {
                run_stages(Arc::clone(self)).await?;
            }
            Ok(())
        }
        .await;

        if result.is_ok() && self.build.lock().status == BuildStatus::Running {
            self.build.lock().status = BuildStatus::Success;
        }
        self.finish_phase(result).await
    }

    /// DestroyBuild (§4.I.5): best-effort teardown of every non-init step,
    /// non-init stage, service, and plugin-secret, then the runtime volume
    /// and network. Errors are logged but never short-circuit; the last
    /// one encountered is returned.
    pub async fn destroy_build(&self) -> Result<(), EngineError> {
        let result = self.destroy_build_inner().await;
        self.upload_build_exit().await;
        result
    }

    async fn destroy_build_inner(&self) -> Result<(), EngineError> {
        let mut last_err = None;

        for step in self.pipeline.non_init_steps() {
            if let Err(err) = self.destroy_step(&step.container).await {
                tracing::error!(step = %step.container.id, error = %err, "failed to destroy step");
                last_err = Some(err);
            }
        }
        for stage in self.pipeline.non_init_stages() {
            for step in &stage.steps {
                if let Err(err) = self.destroy_step(&step.container).await {
                    tracing::error!(step = %step.container.id, error = %err, "failed to destroy step");
                    last_err = Some(err);
                }
            }
        }
        for service in &self.pipeline.services {
            if let Err(err) = self.destroy_service(&service.container).await {
                tracing::error!(service = %service.container.id, error = %err, "failed to destroy service");
                last_err = Some(err);
            }
        }
        for secret in self.pipeline.plugin_secrets() {
            if let Some(origin) = &secret.origin {
                if let Err(err) = self.destroy_plugin_secret(origin).await {
                    tracing::error!(secret = %secret.name, error = %err, "failed to destroy plugin secret");
                    last_err = Some(err);
                }
            }
        }

        if let Err(err) = self.runtime.remove_volume(&self.pipeline).await {
            tracing::error!(error = %err, "failed to remove runtime volume");
            last_err = Some(err.into());
        }
        if let Err(err) = self.runtime.remove_network(&self.pipeline).await {
            tracing::error!(error = %err, "failed to remove runtime network");
            last_err = Some(err.into());
        }

        match last_err {
            Some(err) => {
                self.record_err(err.clone());
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// CancelBuild (§4.I "Cancellation"): marks the build and every
    /// non-success step/service/stage record `canceled`, then delivers
    /// `SIGTERM` to the worker's own process so in-flight phases observe
    /// cancellation at their next suspension point.
    pub async fn cancel_build(&self) -> Result<(), EngineError> {
        self.build.lock().status = BuildStatus::Canceled;

        for id in self.step_records.keys() {
            if let Ok(mut record) = self.step_records.load(&id) {
                if !matches!(record.status, RecordStatus::Success) {
                    record.status = RecordStatus::Canceled;
                    let _ = self.step_records.store(&id, record);
                }
            }
        }
        for id in self.service_records.keys() {
            if let Ok(mut record) = self.service_records.load(&id) {
                if !matches!(record.status, RecordStatus::Success) {
                    record.status = RecordStatus::Canceled;
                    let _ = self.service_records.store(&id, record);
                }
            }
        }

        self.cancel.cancel();
        self.signaler.send_sigterm().await?;
        Ok(())
    }

    fn client_or_err(&self) -> Result<&C, EngineError> {
        self.client
            .as_ref()
            .ok_or_else(|| EngineError::Configuration("no control-plane client configured".to_string()))
    }

    /// Shared tail for the init-log-bearing phases (`plan_build`,
    /// `assemble_build`, `exec_build`): records the phase's error on the
    /// engine (so `upload_build_exit` and any concurrently-running stages
    /// observe it) and pushes the init step's current record
    /// as-is. Unlike `snapshot_step`/`upload_step`, this never infers a
    /// terminal state — the init step never runs a container of its own,
    /// so its record only finalizes via `DestroyBuild`'s `destroy_step`.
    async fn finish_phase(&self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        if let Err(err) = &result {
            self.record_err(err.clone());
        }
        if let Some(init_id) = self.init_step_id() {
            if let (Ok(record), Some(client)) = (self.step_records.load(init_id.as_str()), self.client.as_ref())
            {
                if let Err(err) = client.update_step(&record).await {
                    tracing::warn!(step = %init_id, error = %err, "failed to push init step record");
                }
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
