// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Pipeline`]: the immutable, already-resolved graph of services, steps,
//! stages, and secrets handed to the engine. Read-only once attached to an
//! `Engine` (§3 "Ownership").

use crate::secret::Secret;
use crate::service::Service;
use crate::stage::Stage;
use crate::step::Step;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pipeline {
    pub id: String,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

impl Pipeline {
    /// Whether this pipeline's work is organized as stages rather than a
    /// flat step list.
    pub fn has_stages(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Secrets materialized by running a container, in declared order
    /// (§4.G).
    pub fn plugin_secrets(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.iter().filter(|s| s.is_plugin())
    }

    /// Secrets fetched from the control plane rather than run as a
    /// container (§4.C).
    pub fn fetchable_secrets(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.iter().filter(|s| !s.is_plugin())
    }

    /// Non-`init` stages, in declared order.
    pub fn non_init_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| !s.is_init())
    }

    /// Non-`init` steps, in declared order (flat-step pipelines only).
    pub fn non_init_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| !s.is_init())
    }

    /// Resolve the init container per §4.I: the first element of `steps`,
    /// else the first step of the first stage.
    pub fn init_step(&self) -> Option<&Step> {
        self.steps
            .first()
            .or_else(|| self.stages.first().and_then(|s| s.steps.first()))
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
