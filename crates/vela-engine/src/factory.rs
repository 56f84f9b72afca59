// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`EngineBuilder`] and the driver selector (§4.J): an options-style
//! builder that validates each input and produces an [`Engine`] with every
//! registry initialized empty, `Secrets` empty, and no init step resolved
//! yet (that happens in `CreateBuild`, §4.I).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use vela_core::{Build, Clock, Pipeline, SystemClock};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::cancel::CancelToken;
use crate::engine::{Engine, Trigger};
use crate::error::EngineError;
use crate::registry::Registry;
use crate::secrets::RepoContext;

/// The recognized `driver:` configuration values (§6 "Driver selector
/// surface"). Only `Linux` (the full driver) and `Local` (stdout-only) are
/// recognized strings; building a `Local` engine is an explicit Non-goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Linux,
    Local,
}

/// Validates a `driver:` configuration string (§6). `darwin`/`windows`/
/// anything else is rejected as `unsupported_driver`; `local` is a
/// recognized but unimplemented driver (§4.J).
pub fn select_driver(name: &str) -> Result<DriverKind, EngineError> {
    match name {
        "linux" => Ok(DriverKind::Linux),
        "local" => Ok(DriverKind::Local),
        other => Err(EngineError::unsupported_driver(other)),
    }
}

/// Fails construction if `DriverKind::Local` was selected, since the
/// stdout-only driver's implementation is an explicit Non-goal (§1, §4.J).
pub fn require_implemented(kind: DriverKind) -> Result<(), EngineError> {
    match kind {
        DriverKind::Linux => Ok(()),
        DriverKind::Local => Err(EngineError::driver_not_implemented("local")),
    }
}

/// Options-style builder for [`Engine`] (§4.J). Each `with_*` validates its
/// argument and records it; `build()` fails with the first missing
/// required field.
pub struct EngineBuilder<R, C, S> {
    build: Option<Build>,
    pipeline: Option<Pipeline>,
    repo: Option<RepoContext>,
    runtime: Option<R>,
    client: Option<C>,
    signaler: Option<S>,
    user: Option<String>,
    hostname: Option<String>,
    trigger: Option<Trigger>,
    clock: Option<Arc<dyn Clock>>,
}

impl<R, C, S> Default for EngineBuilder<R, C, S> {
    fn default() -> Self {
        Self {
            build: None,
            pipeline: None,
            repo: None,
            runtime: None,
            client: None,
            signaler: None,
            user: None,
            hostname: None,
            trigger: None,
            clock: None,
        }
    }
}

impl<R, C, S> EngineBuilder<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build(mut self, build: Build) -> Result<Self, EngineError> {
        if build.id.as_str().trim().is_empty() {
            return Err(EngineError::Configuration("build id must not be empty".to_string()));
        }
        self.build = Some(build);
        Ok(self)
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Result<Self, EngineError> {
        if pipeline.id.trim().is_empty() {
            return Err(EngineError::Configuration("pipeline id must not be empty".to_string()));
        }
        self.pipeline = Some(pipeline);
        Ok(self)
    }

    pub fn with_repo(mut self, repo: RepoContext) -> Result<Self, EngineError> {
        if repo.org.trim().is_empty() || repo.name.trim().is_empty() {
            return Err(EngineError::Configuration("repo org/name must not be empty".to_string()));
        }
        self.repo = Some(repo);
        Ok(self)
    }

    pub fn with_runtime(mut self, runtime: R) -> Result<Self, EngineError> {
        self.runtime = Some(runtime);
        Ok(self)
    }

    pub fn with_client(mut self, client: C) -> Result<Self, EngineError> {
        self.client = Some(client);
        Ok(self)
    }

    pub fn with_signaler(mut self, signaler: S) -> Result<Self, EngineError> {
        self.signaler = Some(signaler);
        Ok(self)
    }

    /// The build's triggering user. Carried through for parity with the
    /// source engine's option surface; not otherwise consulted (credential
    /// issuance is an explicit Non-goal).
    pub fn with_user(mut self, user: impl Into<String>) -> Result<Self, EngineError> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(EngineError::Configuration("user must not be empty".to_string()));
        }
        self.user = Some(user);
        Ok(self)
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Result<Self, EngineError> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            return Err(EngineError::Configuration("hostname must not be empty".to_string()));
        }
        self.hostname = Some(hostname);
        Ok(self)
    }

    /// Overrides the clock source. Not part of the source engine's option
    /// surface; added so tests can inject a [`vela_core::FakeClock`]
    /// instead of wall-clock time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the trigger metadata (`branch`/`event`/`tag`/`target`) step
    /// rulesets are evaluated against (§4.H). Defaults to empty strings and
    /// no tag/target when never called.
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn build(self) -> Result<Engine<R, C, S>, EngineError> {
        let build = self
            .build
            .ok_or_else(|| EngineError::Configuration("build is required".to_string()))?;
        let pipeline = self
            .pipeline
            .ok_or_else(|| EngineError::Configuration("pipeline is required".to_string()))?;
        let repo = self
            .repo
            .ok_or_else(|| EngineError::Configuration("repo is required".to_string()))?;
        let runtime = self
            .runtime
            .ok_or_else(|| EngineError::Configuration("runtime is required".to_string()))?;
        let signaler = self
            .signaler
            .ok_or_else(|| EngineError::Configuration("process signaler is required".to_string()))?;
        let hostname = self
            .hostname
            .ok_or_else(|| EngineError::Configuration("hostname is required".to_string()))?;

        Ok(Engine {
            runtime,
            client: self.client,
            signaler,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            hostname,
            user: self.user.unwrap_or_default(),
            repo,
            trigger: self.trigger.unwrap_or_default(),
            build: Mutex::new(build),
            pipeline,
            step_records: Registry::new(),
            service_records: Registry::new(),
            step_logs: Registry::new(),
            service_logs: Registry::new(),
            secrets: RwLock::new(HashMap::new()),
            prepared: Registry::new(),
            err: Mutex::new(None),
            cancel: CancelToken::new(),
            init_step_id: RwLock::new(None),
        })
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
