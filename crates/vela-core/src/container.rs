// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Container`]: the common shape shared by steps, services, and
//! plugin-secrets (§3). `Step`, `Service`, and `PluginSecret` each hold one
//! by composition rather than inheriting from a trait-object hierarchy.

use std::collections::HashMap;

use crate::id::ContainerId;

/// A reference from a container to a pipeline secret: `source` names the
/// secret, `target` names the environment variable (before upper-casing)
/// it is placed into.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecretRef {
    pub source: String,
    pub target: String,
}

/// Per-step/service condition (`if`/`unless`) plus the continue-on-failure
/// flag. Empty lists mean "allow all" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub if_branch: Vec<String>,
    #[serde(default)]
    pub if_event: Vec<String>,
    #[serde(default)]
    pub if_status: Vec<String>,
    #[serde(default)]
    pub unless_branch: Vec<String>,
    #[serde(default)]
    pub unless_event: Vec<String>,
    #[serde(default)]
    pub unless_status: Vec<String>,
    #[serde(default)]
    pub continue_on_failure: bool,
}

/// Build metadata a [`Ruleset`] is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleData {
    pub branch: String,
    pub event: String,
    pub repo: String,
    pub status: String,
    pub tag: Option<String>,
    pub target: Option<String>,
}

fn allow(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|v| v == value)
}

fn deny(list: &[String], value: &str) -> bool {
    !list.is_empty() && list.iter().any(|v| v == value)
}

impl Ruleset {
    /// Whether a step/service carrying this ruleset should execute given
    /// `data` (§8 property 6). `if_*` lists are allow-lists (empty = allow
    /// all); `unless_*` lists are deny-lists (empty = deny nothing). Both
    /// must pass for the container to run.
    pub fn evaluate(&self, data: &RuleData) -> bool {
        let if_ok = allow(&self.if_branch, &data.branch)
            && allow(&self.if_event, &data.event)
            && allow(&self.if_status, &data.status);
        let unless_ok = !deny(&self.unless_branch, &data.branch)
            && !deny(&self.unless_event, &data.event)
            && !deny(&self.unless_status, &data.status);
        if_ok && unless_ok
    }
}

/// The common container shape for steps, services, and plugin-secrets.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    /// 1-based position within the pipeline/stage; 0 is invalid.
    pub number: u32,
    pub image: String,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub detach: bool,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub ruleset: Ruleset,
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
}

impl Container {
    pub fn new(id: impl Into<ContainerId>, name: impl Into<String>, number: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            number,
            image: String::new(),
            environment: HashMap::new(),
            commands: Vec::new(),
            ports: Vec::new(),
            detach: false,
            exit_code: 0,
            ruleset: Ruleset::default(),
            secrets: Vec::new(),
        }
    }

    pub fn is_init(&self) -> bool {
        self.name == "init"
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
