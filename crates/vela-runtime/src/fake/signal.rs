// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`ProcessSignaler`] for deterministic testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::signal::{ProcessSignaler, SignalError};

#[derive(Clone, Default)]
pub struct FakeProcessSignaler {
    count: Arc<AtomicUsize>,
}

impl FakeProcessSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sigterm_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessSignaler for FakeProcessSignaler {
    async fn send_sigterm(&self) -> Result<(), SignalError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_each_sigterm_request() {
        let signaler = FakeProcessSignaler::new();
        signaler.send_sigterm().await.unwrap();
        signaler.send_sigterm().await.unwrap();
        assert_eq!(signaler.sigterm_count(), 2);
    }
}
