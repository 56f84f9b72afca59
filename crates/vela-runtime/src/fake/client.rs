// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`VelaClient`] for deterministic testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use vela_core::{Build, LogRecord, Secret, SecretEngine, SecretType, ServiceRecord, StepRecord};

use crate::client::{ClientError, VelaClient};

/// Recorded call to [`FakeVelaClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    UpdateBuild,
    UpdateStep(String),
    UpdateService(String),
    GetStepLog(String),
    GetServiceLog(String),
    UpdateStepLog(String),
    UpdateServiceLog(String),
    GetSecret { kind: &'static str, key: String },
}

#[derive(Default)]
struct State {
    calls: Vec<ClientCall>,
    builds: Vec<Build>,
    step_logs: HashMap<String, LogRecord>,
    service_logs: HashMap<String, LogRecord>,
    secrets: HashMap<String, Secret>,
    errors: HashMap<&'static str, ClientError>,
}

/// Fake control-plane client for testing. Records every call, stores
/// pushed builds/logs in memory, and lets tests program secrets and
/// per-operation failures.
#[derive(Clone, Default)]
pub struct FakeVelaClient {
    inner: Arc<Mutex<State>>,
}

impl FakeVelaClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.inner.lock().calls.clone()
    }

    pub fn builds(&self) -> Vec<Build> {
        self.inner.lock().builds.clone()
    }

    pub fn last_build(&self) -> Option<Build> {
        self.inner.lock().builds.last().cloned()
    }

    pub fn step_log(&self, id: &str) -> Option<LogRecord> {
        self.inner.lock().step_logs.get(id).cloned()
    }

    pub fn put_secret(&self, key: &str, secret: Secret) {
        self.inner.lock().secrets.insert(key.to_string(), secret);
    }

    pub fn fail_next(&self, op: &'static str, err: ClientError) {
        self.inner.lock().errors.insert(op, err);
    }

    fn take_error(&self, op: &'static str) -> Option<ClientError> {
        self.inner.lock().errors.remove(op)
    }
}

#[async_trait]
impl VelaClient for FakeVelaClient {
    async fn update_build(&self, build: &Build) -> Result<(), ClientError> {
        self.inner.lock().calls.push(ClientCall::UpdateBuild);
        if let Some(err) = self.take_error("update_build") {
            return Err(err);
        }
        self.inner.lock().builds.push(build.clone());
        Ok(())
    }

    async fn update_step(&self, record: &StepRecord) -> Result<StepRecord, ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::UpdateStep(record.id.to_string()));
        if let Some(err) = self.take_error("update_step") {
            return Err(err);
        }
        Ok(record.clone())
    }

    async fn update_service(&self, record: &ServiceRecord) -> Result<ServiceRecord, ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::UpdateService(record.id.to_string()));
        if let Some(err) = self.take_error("update_service") {
            return Err(err);
        }
        Ok(record.clone())
    }

    async fn get_step_log(&self, step_id: &str) -> Result<LogRecord, ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::GetStepLog(step_id.to_string()));
        Ok(self
            .inner
            .lock()
            .step_logs
            .get(step_id)
            .cloned()
            .unwrap_or_else(|| LogRecord::new(step_id)))
    }

    async fn get_service_log(&self, service_id: &str) -> Result<LogRecord, ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::GetServiceLog(service_id.to_string()));
        Ok(self
            .inner
            .lock()
            .service_logs
            .get(service_id)
            .cloned()
            .unwrap_or_else(|| LogRecord::new(service_id)))
    }

    async fn update_step_log(&self, log: &LogRecord) -> Result<(), ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::UpdateStepLog(log.id.clone()));
        if let Some(err) = self.take_error("update_step_log") {
            return Err(err);
        }
        self.inner
            .lock()
            .step_logs
            .insert(log.id.clone(), log.clone());
        Ok(())
    }

    async fn update_service_log(&self, log: &LogRecord) -> Result<(), ClientError> {
        self.inner
            .lock()
            .calls
            .push(ClientCall::UpdateServiceLog(log.id.clone()));
        if let Some(err) = self.take_error("update_service_log") {
            return Err(err);
        }
        self.inner
            .lock()
            .service_logs
            .insert(log.id.clone(), log.clone());
        Ok(())
    }

    async fn get_secret(
        &self,
        _engine: SecretEngine,
        kind: SecretType,
        org: &str,
        repo_or_team_or_star: &str,
        key: &str,
    ) -> Result<Secret, ClientError> {
        let lookup = format!("{}/{}/{}", org, repo_or_team_or_star, key);
        self.inner.lock().calls.push(ClientCall::GetSecret {
            kind: kind.as_str(),
            key: lookup.clone(),
        });
        if let Some(err) = self.take_error("get_secret") {
            return Err(err);
        }
        self.inner
            .lock()
            .secrets
            .get(&lookup)
            .cloned()
            .ok_or(ClientError::NotFound(lookup))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
