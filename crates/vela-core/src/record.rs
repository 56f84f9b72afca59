// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ContainerRecord`]: the per-container runtime state shared by steps and
//! services, parameterized by a zero-sized [`RecordKind`] marker so
//! snapshot/upload (§4.B) is written once and reused for both kinds
//! instead of duplicated — the same pattern the teacher uses for
//! `ActivityLogger<K: LogKind>`.

use std::marker::PhantomData;

use crate::id::ContainerId;

/// Status of a step/service record. Once it leaves `Pending` it cannot
/// return to `Pending` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Running,
    Success,
    Failure,
    Killed,
    Canceled,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Killed => "killed",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Marker supplying the tracing field name (`step=` vs `service=`) and the
/// record kind's label for a [`ContainerRecord`] instantiation.
pub trait RecordKind {
    const FIELD: &'static str;
}

pub struct StepKind;
impl RecordKind for StepKind {
    const FIELD: &'static str = "step";
}

pub struct ServiceKind;
impl RecordKind for ServiceKind {
    const FIELD: &'static str = "service";
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct ContainerRecord<K> {
    pub id: ContainerId,
    pub name: String,
    pub number: u32,
    pub status: RecordStatus,
    #[serde(default)]
    pub started: i64,
    #[serde(default)]
    pub finished: i64,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(skip)]
    _kind: PhantomData<fn() -> K>,
}

pub type StepRecord = ContainerRecord<StepKind>;
pub type ServiceRecord = ContainerRecord<ServiceKind>;

impl<K: RecordKind> ContainerRecord<K> {
    /// A freshly planned record: `status = running`, `started = now`
    /// (§4.E PlanStep).
    pub fn planned(id: ContainerId, name: impl Into<String>, number: u32, now: i64) -> Self {
        Self {
            id,
            name: name.into(),
            number,
            status: RecordStatus::Running,
            started: now,
            finished: 0,
            exit_code: 0,
            host: String::new(),
            runtime: String::new(),
            distribution: String::new(),
            _kind: PhantomData,
        }
    }

    /// A record created defensively when Destroy finds none registered
    /// (§4.E DestroyStep: "create a fresh pending one if missing").
    pub fn pending(id: ContainerId, name: impl Into<String>, number: u32) -> Self {
        Self {
            id,
            name: name.into(),
            number,
            status: RecordStatus::Pending,
            started: 0,
            finished: 0,
            exit_code: 0,
            host: String::new(),
            runtime: String::new(),
            distribution: String::new(),
            _kind: PhantomData,
        }
    }

    pub fn field_name(&self) -> &'static str {
        K::FIELD
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
