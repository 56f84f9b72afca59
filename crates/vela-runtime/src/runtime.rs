// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ContainerRuntime`]: the container-runtime contract consumed by the
//! drivers (§6). The concrete engine (Docker/Kubernetes/etc.) is an
//! external collaborator; this crate only specifies the trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use vela_core::{Container, Pipeline};

/// Failures surfaced by a [`ContainerRuntime`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeEngineError {
    #[error("image not found: {0}")]
    ImageNotFound(String),
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("volume error: {0}")]
    Volume(String),
    #[error("runtime error: {0}")]
    Other(String),
}

/// The container-runtime operations the engine drives a build through
/// (§6 "Runtime engine (consumed)").
#[async_trait]
pub trait ContainerRuntime: Clone + Send + Sync + 'static {
    async fn setup_container(&self, container: &Container) -> Result<(), RuntimeEngineError>;

    async fn run_container(
        &self,
        container: &Container,
        pipeline: &Pipeline,
    ) -> Result<(), RuntimeEngineError>;

    async fn wait_container(&self, container: &Container) -> Result<(), RuntimeEngineError>;

    /// Populates `container.exit_code` from the runtime's view of the
    /// container.
    async fn inspect_container(&self, container: &mut Container) -> Result<(), RuntimeEngineError>;

    async fn remove_container(&self, container: &Container) -> Result<(), RuntimeEngineError>;

    /// Returns a reader over the container's combined stdout/stderr, for
    /// the log-streaming loop (§4.E).
    async fn tail_container(
        &self,
        container: &Container,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, RuntimeEngineError>;

    async fn inspect_image(&self, container: &Container) -> Result<Vec<u8>, RuntimeEngineError>;

    async fn create_network(&self, pipeline: &Pipeline) -> Result<(), RuntimeEngineError>;
    async fn inspect_network(&self, pipeline: &Pipeline) -> Result<Vec<u8>, RuntimeEngineError>;
    async fn remove_network(&self, pipeline: &Pipeline) -> Result<(), RuntimeEngineError>;

    async fn create_volume(&self, pipeline: &Pipeline) -> Result<(), RuntimeEngineError>;
    async fn inspect_volume(&self, pipeline: &Pipeline) -> Result<Vec<u8>, RuntimeEngineError>;
    async fn remove_volume(&self, pipeline: &Pipeline) -> Result<(), RuntimeEngineError>;

    /// Name of the concrete runtime driver (`"docker"`, `"kubernetes"`, ...).
    fn driver(&self) -> &str;
}
