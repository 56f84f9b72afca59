// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`VelaClient`]: the control-plane HTTP client contract consumed by the
//! engine (§6). The concrete client is an external collaborator; this
//! crate only specifies the trait.

use async_trait::async_trait;
use thiserror::Error;
use vela_core::{Build, LogRecord, Secret, SecretEngine, SecretType, ServiceRecord, StepRecord};

/// Failures surfaced by a [`VelaClient`] implementation. All calls are
/// best-effort from the engine's perspective (§6): failures are logged but
/// never halt Destroy or log uploads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// The control-plane operations the engine calls to report progress and
/// fetch secrets (§6 "Control-plane client (consumed)").
#[async_trait]
pub trait VelaClient: Clone + Send + Sync + 'static {
    async fn update_build(&self, build: &Build) -> Result<(), ClientError>;

    /// Pushes a step record and returns the control plane's copy (which may
    /// assign fields the engine doesn't set locally, e.g. a server-side id).
    async fn update_step(&self, record: &StepRecord) -> Result<StepRecord, ClientError>;
    async fn update_service(&self, record: &ServiceRecord) -> Result<ServiceRecord, ClientError>;

    async fn get_step_log(&self, step_id: &str) -> Result<LogRecord, ClientError>;
    async fn get_service_log(&self, service_id: &str) -> Result<LogRecord, ClientError>;
    async fn update_step_log(&self, log: &LogRecord) -> Result<(), ClientError>;
    async fn update_service_log(&self, log: &LogRecord) -> Result<(), ClientError>;

    async fn get_secret(
        &self,
        engine: SecretEngine,
        kind: SecretType,
        org: &str,
        repo_or_team_or_star: &str,
        key: &str,
    ) -> Result<Secret, ClientError>;
}
