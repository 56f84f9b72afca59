// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared between `vela-core` and `vela-engine` (crossing the
//! crate boundary is the whole reason these live here rather than in
//! `vela-engine::error`, which composes them with `#[from]`).

use thiserror::Error;

/// Failures from resolving or validating a pipeline secret (§4.C).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("unrecognized secret engine: {0}")]
    UnrecognizedSecretEngine(String),
    #[error("unrecognized secret type: {0}")]
    UnrecognizedSecretType(String),
    #[error("unable to retrieve secret {name}: {reason}")]
    UnableToRetrieve { name: String, reason: String },
    #[error("malformed secret path {path:?} for type {kind}")]
    MalformedPath { kind: String, path: String },
}
