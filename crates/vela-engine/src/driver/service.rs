// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service driver (§4.F): identical shape to the step driver, with a
//! separate registry/log map, always-detached execution, and its own log
//! record rather than the init step's.

use std::sync::Arc;

use vela_core::{Container, ServiceRecord};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::driver::{stream_container, LogTarget};
use crate::engine::Engine;
use crate::env::{apply_default_environment, substitute_environment};
use crate::error::EngineError;
use crate::secrets::inject_secrets;
use crate::snapshot::{snapshot_service, upload_service};

impl<R, C, S> Engine<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    /// Prepares a service container for execution (§4.F): default
    /// environment, `SetupContainer`, secret injection, `${VAR}`
    /// substitution. Services always run, so there is no `name == "init"`
    /// rejection as with steps.
    pub async fn create_service(&self, container: &mut Container) -> Result<(), EngineError> {
        container.detach = true;
        let distribution = self.build.lock().distribution.clone();
        apply_default_environment(container, &self.hostname, self.runtime.driver(), &distribution);
        self.runtime.setup_container(container).await?;
        inject_secrets(container, &self.secrets.read());
        substitute_environment(container);
        let _ = self.prepared.store(container.id.as_str(), container.clone());
        Ok(())
    }

    /// Returns the container as configured by a prior `create_service`,
    /// falling back to running `create_service` against a copy of
    /// `fallback` when nothing was prepared (mirrors
    /// [`prepared_step`](Self::prepared_step)).
    pub(crate) async fn prepared_service(&self, fallback: &Container) -> Result<Container, EngineError> {
        if let Ok(container) = self.prepared.load(fallback.id.as_str()) {
            return Ok(container);
        }
        let mut container = fallback.clone();
        self.create_service(&mut container).await?;
        Ok(container)
    }

    /// Plans a service: a fresh `running` record and an empty log record,
    /// stored under the service registry (§4.F).
    pub async fn plan_service(&self, container: &Container) -> Result<ServiceRecord, EngineError> {
        if container.number == 0 {
            return Err(EngineError::Validation(
                "service number must be >= 1".to_string(),
            ));
        }
        let now = self.clock.now();
        let record = ServiceRecord::planned(container.id.clone(), &container.name, container.number, now);
        let record = match &self.client {
            Some(client) => client.update_service(&record).await?,
            None => record,
        };
        self.service_records.store(container.id.as_str(), record.clone())?;

        let log = match &self.client {
            Some(client) => client
                .get_service_log(container.id.as_str())
                .await
                .unwrap_or_else(|_| vela_core::LogRecord::new(container.id.as_str())),
            None => vela_core::LogRecord::new(container.id.as_str()),
        };
        self.service_logs.store(container.id.as_str(), log)?;
        Ok(record)
    }

    /// Runs a service container and spawns its log streamer. Services are
    /// always detached, so unlike `exec_step` this never waits for exit —
    /// the streamer runs for the service's lifetime in the background.
    pub async fn exec_service(self: &Arc<Self>, container: Container) -> Result<(), EngineError> {
        self.runtime.run_container(&container, &self.pipeline).await?;
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = engine.stream_service(&container).await {
                tracing::warn!(service = %container.id, error = %err, "service log streamer failed");
            }
        });
        Ok(())
    }

    /// Tails a service container's output into its own log record (§4.F).
    pub async fn stream_service(&self, container: &Container) -> Result<(), EngineError> {
        stream_container(
            self,
            container,
            container.id.as_str(),
            &self.service_logs,
            LogTarget::Service,
        )
        .await
    }

    /// Loads (or defensively creates) the service record, inspects then
    /// removes the container, and always uploads the record (§4.F, mirrors
    /// `destroy_step`).
    pub async fn destroy_service(&self, container: &Container) -> Result<(), EngineError> {
        if self.service_records.load(container.id.as_str()).is_err() {
            let pending = ServiceRecord::pending(container.id.clone(), &container.name, container.number);
            self.service_records.store(container.id.as_str(), pending)?;
        }

        let mut inspected = container.clone();
        let result: Result<(), EngineError> = async {
            self.runtime.inspect_container(&mut inspected).await?;
            self.runtime.remove_container(&inspected).await?;
            Ok(())
        }
        .await;

        let upload = upload_service(
            container.id.as_str(),
            &self.service_records,
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
#[path = "service_tests.rs"]
mod tests;
