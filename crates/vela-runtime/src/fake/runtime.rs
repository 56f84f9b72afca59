// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`ContainerRuntime`] for deterministic testing.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, ReadBuf};
use vela_core::{Container, Pipeline};

use crate::runtime::{ContainerRuntime, RuntimeEngineError};

/// Recorded call to [`FakeContainerRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    SetupContainer(String),
    RunContainer(String),
    WaitContainer(String),
    InspectContainer(String),
    RemoveContainer(String),
    TailContainer(String),
    InspectImage(String),
    CreateNetwork,
    InspectNetwork,
    RemoveNetwork,
    CreateVolume,
    InspectVolume,
    RemoveVolume,
}

#[derive(Default)]
struct State {
    calls: Vec<RuntimeCall>,
    exit_codes: HashMap<String, i32>,
    tail_output: HashMap<String, Vec<u8>>,
    missing_containers: std::collections::HashSet<String>,
    missing_images: std::collections::HashSet<String>,
    errors: HashMap<&'static str, RuntimeEngineError>,
}

/// Fake container runtime for testing. Records every call and lets tests
/// program exit codes, tailed output, and per-operation failures.
#[derive(Clone, Default)]
pub struct FakeContainerRuntime {
    inner: Arc<Mutex<State>>,
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_exit_code(&self, container_id: &str, code: i32) {
        self.inner
            .lock()
            .exit_codes
            .insert(container_id.to_string(), code);
    }

    pub fn set_tail_output(&self, container_id: &str, bytes: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .tail_output
            .insert(container_id.to_string(), bytes.into());
    }

    pub fn mark_container_missing(&self, container_id: &str) {
        self.inner
            .lock()
            .missing_containers
            .insert(container_id.to_string());
    }

    pub fn mark_image_missing(&self, container_id: &str) {
        self.inner
            .lock()
            .missing_images
            .insert(container_id.to_string());
    }

    /// Fail the next call to the named operation (`"create_network"`,
    /// `"create_volume"`, ...) with the given error.
    pub fn fail_next(&self, op: &'static str, err: RuntimeEngineError) {
        self.inner.lock().errors.insert(op, err);
    }

    fn take_error(&self, op: &'static str) -> Option<RuntimeEngineError> {
        self.inner.lock().errors.remove(op)
    }
}

struct ByteReader {
    data: Vec<u8>,
    pos: usize,
}

impl AsyncRead for ByteReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let remaining = &this.data[this.pos..];
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl ContainerRuntime for FakeContainerRuntime {
    async fn setup_container(&self, container: &Container) -> Result<(), RuntimeEngineError> {
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::SetupContainer(container.id.to_string()));
        Ok(())
    }

    async fn run_container(
        &self,
        container: &Container,
        _pipeline: &Pipeline,
    ) -> Result<(), RuntimeEngineError> {
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::RunContainer(container.id.to_string()));
        Ok(())
    }

    async fn wait_container(&self, container: &Container) -> Result<(), RuntimeEngineError> {
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::WaitContainer(container.id.to_string()));
        Ok(())
    }

    async fn inspect_container(
        &self,
        container: &mut Container,
    ) -> Result<(), RuntimeEngineError> {
        let id = container.id.to_string();
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::InspectContainer(id.clone()));
        if self.inner.lock().missing_containers.contains(&id) {
            return Err(RuntimeEngineError::ContainerNotFound(id));
        }
        container.exit_code = self.inner.lock().exit_codes.get(&id).copied().unwrap_or(0);
        Ok(())
    }

    async fn remove_container(&self, container: &Container) -> Result<(), RuntimeEngineError> {
        let id = container.id.to_string();
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::RemoveContainer(id.clone()));
        if self.inner.lock().missing_containers.contains(&id) {
            return Err(RuntimeEngineError::ContainerNotFound(id));
        }
        Ok(())
    }

    async fn tail_container(
        &self,
        container: &Container,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, RuntimeEngineError> {
        let id = container.id.to_string();
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::TailContainer(id.clone()));
        let data = self
            .inner
            .lock()
            .tail_output
            .get(&id)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(ByteReader { data, pos: 0 }))
    }

    async fn inspect_image(&self, container: &Container) -> Result<Vec<u8>, RuntimeEngineError> {
        let id = container.id.to_string();
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::InspectImage(id.clone()));
        if self.inner.lock().missing_images.contains(&id) {
            return Err(RuntimeEngineError::ImageNotFound(container.image.clone()));
        }
        Ok(format!("{{\"image\":\"{}\"}}", container.image).into_bytes())
    }

    async fn create_network(&self, _pipeline: &Pipeline) -> Result<(), RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::CreateNetwork);
        if let Some(err) = self.take_error("create_network") {
            return Err(err);
        }
        Ok(())
    }

    async fn inspect_network(&self, _pipeline: &Pipeline) -> Result<Vec<u8>, RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::InspectNetwork);
        if let Some(err) = self.take_error("inspect_network") {
            return Err(err);
        }
        Ok(b"{\"network\":\"ok\"}".to_vec())
    }

    async fn remove_network(&self, _pipeline: &Pipeline) -> Result<(), RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::RemoveNetwork);
        if let Some(err) = self.take_error("remove_network") {
            return Err(err);
        }
        Ok(())
    }

    async fn create_volume(&self, _pipeline: &Pipeline) -> Result<(), RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::CreateVolume);
        if let Some(err) = self.take_error("create_volume") {
            return Err(err);
        }
        Ok(())
    }

    async fn inspect_volume(&self, _pipeline: &Pipeline) -> Result<Vec<u8>, RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::InspectVolume);
        if let Some(err) = self.take_error("inspect_volume") {
            return Err(err);
        }
        Ok(b"{\"volume\":\"ok\"}".to_vec())
    }

    async fn remove_volume(&self, _pipeline: &Pipeline) -> Result<(), RuntimeEngineError> {
        self.inner.lock().calls.push(RuntimeCall::RemoveVolume);
        if let Some(err) = self.take_error("remove_volume") {
            return Err(err);
        }
        Ok(())
    }

    fn driver(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
