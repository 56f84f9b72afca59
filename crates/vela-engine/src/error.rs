// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`EngineError`]: the error type every phase/driver operation returns
//! (§7).

use thiserror::Error;
use vela_core::SecretError;
use vela_runtime::{ClientError, RuntimeEngineError, SignalError};

use crate::registry::RegistryError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("group context is done")]
    Cancelled,
}

impl From<RuntimeEngineError> for EngineError {
    fn from(err: RuntimeEngineError) -> Self {
        EngineError::Runtime(err.to_string())
    }
}

impl From<ClientError> for EngineError {
    fn from(err: ClientError) -> Self {
        EngineError::Remote(err.to_string())
    }
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<SignalError> for EngineError {
    fn from(err: SignalError) -> Self {
        EngineError::Runtime(err.to_string())
    }
}

impl EngineError {
    pub fn unsupported_driver(name: &str) -> Self {
        EngineError::Configuration(format!("unsupported driver: {name}"))
    }

    pub fn driver_not_implemented(name: &str) -> Self {
        EngineError::Configuration(format!("driver not implemented: {name}"))
    }
}
