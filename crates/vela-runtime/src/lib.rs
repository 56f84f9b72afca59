// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vela-runtime: trait contracts for the two external collaborators the
//! engine drives — the container runtime and the control-plane client —
//! plus fake in-memory implementations for tests (feature `test-support`).

pub mod client;
pub mod runtime;
pub mod signal;

pub use client::{ClientError, VelaClient};
pub use runtime::{ContainerRuntime, RuntimeEngineError};
pub use signal::{ProcessSignaler, RealProcessSignaler, SignalError, SIGNAL_TIMEOUT};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClientCall, FakeContainerRuntime, FakeProcessSignaler, FakeVelaClient, RuntimeCall};
