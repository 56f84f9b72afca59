// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Registry`]: a thread-safe map from container-id to a typed record
//! (§4.A). One instance per kind (`steps`, `services`, `step_logs`,
//! `service_logs`) is held on the engine; created during Plan, destroyed
//! with the build.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

/// Failures distinguishing a missing key from a malformed lookup (§4.A:
/// "these two errors must be distinct so tests can assert on them"). Rust's
/// type system already rules out the Go-style "wrong dynamic type" failure
/// a `sync.Map` risks, so `InvalidContainer` covers malformed/empty ids
/// instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid container id: {0}")]
    InvalidContainer(String),
}

/// Concurrent map from string key to a typed value.
#[derive(Default)]
pub struct Registry<T> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T: Clone> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self, id: impl Into<String>, value: T) -> Result<(), RegistryError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidContainer(
                "empty container id".to_string(),
            ));
        }
        self.inner.write().insert(id, value);
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<T, RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidContainer(
                "empty container id".to_string(),
            ));
        }
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        self.inner.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn values(&self) -> Vec<T> {
        self.inner.read().values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
