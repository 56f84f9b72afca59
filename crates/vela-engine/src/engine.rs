// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Engine`]: the aggregate the orchestrator and per-kind drivers operate
//! on. Holds the registries (§4.A), the `Secrets` map, the init-step
//! reference, and the `err` field — the only state the engine exclusively
//! owns per §3 "Ownership". Driver operations are plain methods on `Engine`
//! rather than a back-pointer struct (§9).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use vela_core::{Build, Clock, Container, ContainerId, LogRecord, Pipeline, RuleData, Secret, ServiceRecord, StepRecord};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::registry::Registry;
use crate::secrets::RepoContext;

/// Trigger metadata a [`Ruleset`](vela_core::Ruleset) is evaluated against
/// (§4.H ExecStage: "branch, event, repo full-name, current build status;
/// plus tag when event is tag, target when event is deployment"). The
/// compiled pipeline doesn't carry these itself (they describe the
/// triggering commit/event, supplied by the external pipeline compiler per
/// §1 Non-goals), so the engine takes them as a constructor input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    pub branch: String,
    pub event: String,
    pub tag: Option<String>,
    pub target: Option<String>,
}

/// The pipeline execution engine. Generic over the three external
/// collaborators (`R`: container runtime, `C`: control-plane client, `S`:
/// process signaler) so tests wire in the `Fake*` doubles from
/// `vela_runtime` and production wires in the real adapters.
pub struct Engine<R, C, S> {
    pub(crate) runtime: R,
    pub(crate) client: Option<C>,
    pub(crate) signaler: S,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hostname: String,
    pub(crate) user: String,
    pub(crate) repo: RepoContext,
    pub(crate) trigger: Trigger,

    pub(crate) build: Mutex<Build>,
    pub(crate) pipeline: Pipeline,

    pub(crate) step_records: Registry<StepRecord>,
    pub(crate) service_records: Registry<ServiceRecord>,
    pub(crate) step_logs: Registry<LogRecord>,
    pub(crate) service_logs: Registry<LogRecord>,
    pub(crate) secrets: RwLock<HashMap<String, Secret>>,

    /// Containers as configured by `create_step`/`create_service` (default
    /// environment, secret injection, `${VAR}` substitution applied),
    /// keyed by container id. AssembleBuild populates this; ExecBuild and
    /// the stage scheduler read it back rather than re-deriving an
    /// unconfigured container from the read-only pipeline (§4.I: Assemble
    /// creates once, Exec only plans/execs).
    pub(crate) prepared: Registry<Container>,

    pub(crate) err: Mutex<Option<EngineError>>,
    pub(crate) cancel: CancelToken,
    pub(crate) init_step_id: RwLock<Option<ContainerId>>,
}

impl<R, C, S> Engine<R, C, S>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn build_snapshot(&self) -> Build {
        self.build.lock().clone()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Records the first failing operation's error (§5: "written by the
    /// most recent failing operation; readers after join see the last
    /// write"). Also cancels the shared token so concurrent stages observe
    /// it at their next `needs` wait.
    pub(crate) fn record_err(&self, err: EngineError) {
        *self.err.lock() = Some(err);
        self.cancel.cancel();
    }

    pub(crate) fn take_err(&self) -> Option<EngineError> {
        self.err.lock().clone()
    }

    pub(crate) fn init_step_id(&self) -> Option<ContainerId> {
        self.init_step_id.read().clone()
    }

    pub(crate) fn set_init_step_id(&self, id: ContainerId) {
        *self.init_step_id.write() = Some(id);
    }

    /// Appends a single progress line to the init step's log (§4.I, §8
    /// property 7). A no-op if the init step hasn't been resolved yet.
    pub(crate) fn append_init_log(&self, line: &str) {
        let Some(id) = self.init_step_id() else {
            return;
        };
        let mut log = self
            .step_logs
            .load(id.as_str())
            .unwrap_or_else(|_| LogRecord::new(id.as_str()));
        log.append_line(line);
        let _ = self.step_logs.store(id.as_str(), log);
    }

    /// Builds the [`RuleData`] a step/stage's [`Ruleset`](vela_core::Ruleset)
    /// is evaluated against from the engine's current build status and
    /// trigger metadata (§4.H ExecStage).
    pub(crate) fn rule_data(&self) -> RuleData {
        let status = self.build.lock().status.to_string();
        let (tag, target) = match self.trigger.event.as_str() {
            "tag" => (self.trigger.tag.clone(), None),
            "deployment" => (None, self.trigger.target.clone()),
            _ => (None, None),
        };
        RuleData {
            branch: self.trigger.branch.clone(),
            event: self.trigger.event.clone(),
            repo: self.repo.full_name(),
            status,
            tag,
            target,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
