// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Build`]: the aggregate run record (§3).

use crate::id::BuildId;

/// Status of a build. Monotone away from `Running` once reached: a single
/// execution never returns a terminal build to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Running,
    Success,
    Failure,
    Error,
    Killed,
    Canceled,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
            Self::Killed => "killed",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub status: BuildStatus,
    #[serde(default)]
    pub started: i64,
    #[serde(default)]
    pub finished: i64,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Build {
    pub fn new(id: impl Into<BuildId>) -> Self {
        Self {
            id: id.into(),
            status: BuildStatus::Pending,
            started: 0,
            finished: 0,
            host: String::new(),
            distribution: String::new(),
            runtime: String::new(),
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
