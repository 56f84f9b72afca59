// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin-secret driver (§4.G): a plugin-secret is a container-origin
//! secret, run as a short-lived container whose stdout folds into the
//! **init step's** log rather than its own.

use std::sync::Arc;

use vela_core::{BuildStatus, Container, RecordStatus, StepRecord};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::driver::{stream_container, LogTarget};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::registry::Registry;

async fn push_step_record<C: VelaClient>(
    step_id: &str,
    records: &Registry<StepRecord>,
    client: Option<&C>,
) -> Result<(), EngineError> {
    let record = records.load(step_id)?;
    if let Some(client) = client {
        if let Err(err) = client.update_step(&record).await {
            tracing::warn!(step = step_id, error = %err, "failed to push init step record");
        }
    }
    Ok(())
}

impl<R, C, S> Engine<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    /// Prepares a plugin-secret container. Follows the step pattern
    /// (§4.G), so it delegates to [`create_step`](Self::create_step).
    pub async fn create_plugin_secret(&self, container: &mut Container) -> Result<(), EngineError> {
        self.create_step(container).await
    }

    /// Tears down a plugin-secret container. Follows the step pattern
    /// (§4.G), so it delegates to [`destroy_step`](Self::destroy_step).
    pub async fn destroy_plugin_secret(&self, container: &Container) -> Result<(), EngineError> {
        self.destroy_step(container).await
    }

    /// Tails a plugin-secret container's output into the init step's log
    /// (§4.G, chunked as in §4.E).
    pub async fn stream_plugin_secret(&self, container: &Container) -> Result<(), EngineError> {
        let Some(init_id) = self.init_step_id() else {
            return Ok(());
        };
        stream_container(self, container, init_id.as_str(), &self.step_logs, LogTarget::Step).await
    }

    /// Runs every plugin-secret container in declared order, folding each
    /// one's output into the init step's log (§4.G). A non-zero exit with
    /// `ruleset.continue == false` fails the build and copies the exit
    /// code/status onto the init step record; otherwise execution
    /// continues with the next secret. The init step record is pushed
    /// after each one.
    pub async fn exec_plugin_secrets(self: &Arc<Self>) -> Result<(), EngineError> {
        let Some(init_id) = self.init_step_id() else {
            return Ok(());
        };
        let origins: Vec<Container> = self
            .pipeline
            .plugin_secrets()
            .filter_map(|secret| secret.origin.clone())
            .collect();

        for origin in origins {
            let container = self.prepared_step(&origin).await?;
            self.runtime.run_container(&container, &self.pipeline).await?;

            let streamer = {
                let engine = Arc::clone(self);
                let streamed = container.clone();
                tokio::spawn(async move { engine.stream_plugin_secret(&streamed).await })
            };

            self.runtime.wait_container(&container).await?;
            let mut inspected = container.clone();
            let inspect_result = self.runtime.inspect_container(&mut inspected).await;

            match streamer.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(secret = %container.name, error = %err, "plugin secret log streamer failed")
                }
                Err(join_err) => {
                    tracing::warn!(secret = %container.name, error = %join_err, "plugin secret log streamer task panicked")
                }
            }
            inspect_result?;

            if inspected.exit_code != 0 && !container.ruleset.continue_on_failure {
                self.build.lock().status = BuildStatus::Failure;
                if let Ok(mut record) = self.step_records.load(init_id.as_str()) {
                    record.exit_code = inspected.exit_code;
                    record.status = RecordStatus::Failure;
                    self.step_records.store(init_id.as_str(), record)?;
                }
            }

            push_step_record::<C>(init_id.as_str(), &self.step_records, self.client.as_ref()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
