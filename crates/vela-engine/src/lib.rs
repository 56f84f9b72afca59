// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vela-engine: the pipeline execution engine. [`Engine`] holds the
//! per-build state; its phase methods (`create_build`, `plan_build`,
//! `assemble_build`, `exec_build`, `destroy_build`, `cancel_build`, in
//! [`build`]) and per-kind drivers (in [`driver`]) drive a build through
//! to completion against a [`vela_runtime::ContainerRuntime`], a
//! [`vela_runtime::VelaClient`], and a [`vela_runtime::ProcessSignaler`].
//! [`EngineBuilder`] in [`factory`] constructs one.

pub mod build;
pub mod cancel;
pub mod driver;
pub mod engine;
pub mod env;
pub mod error;
pub mod factory;
pub mod registry;
pub mod scheduler;
pub mod secrets;
pub mod snapshot;

pub use cancel::CancelToken;
pub use engine::{Engine, Trigger};
pub use error::EngineError;
pub use factory::{select_driver, require_implemented, DriverKind, EngineBuilder};
pub use registry::{Registry, RegistryError};
