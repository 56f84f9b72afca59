// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ProcessSignaler`]: delivers `SIGTERM` to the worker's own process for
//! `CancelBuild` (§4.I, §6 "Process signal"). Abstracted behind a trait
//! (rather than a direct libc/nix call) so unit tests can assert a signal
//! was requested without actually terminating the test runner.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal delivery failed: {0}")]
    Failed(String),
}

/// Default timeout for the `kill` subprocess used to deliver SIGTERM.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait ProcessSignaler: Clone + Send + Sync + 'static {
    async fn send_sigterm(&self) -> Result<(), SignalError>;
}

/// Delivers SIGTERM to the current process by shelling out to `kill -TERM
/// <pid>`, the same `tokio::process::Command` + timeout pattern the
/// adapters crate uses for tmux/git subprocess calls (no direct signal
/// syscall means no `unsafe` block is needed under the workspace's
/// `unsafe_code = "forbid"` lint).
#[derive(Clone, Copy, Default)]
pub struct RealProcessSignaler;

#[async_trait]
impl ProcessSignaler for RealProcessSignaler {
    async fn send_sigterm(&self) -> Result<(), SignalError> {
        let pid = std::process::id();
        let mut cmd = Command::new("kill");
        cmd.arg("-TERM").arg(pid.to_string());
        match timeout(SIGNAL_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(SignalError::Failed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )),
            Ok(Err(io_err)) => Err(SignalError::Failed(io_err.to_string())),
            Err(_elapsed) => Err(SignalError::Failed("kill -TERM timed out".to_string())),
        }
    }
}
