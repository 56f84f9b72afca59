// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[tokio::test]
async fn cancelled_resolves_immediately_once_set() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());
    token.cancel();
    assert!(token.is_cancelled());
    tokio::time::timeout(Duration::from_millis(50), token.cancelled())
        .await
        .expect("cancelled() should resolve instantly once already cancelled");
}

#[tokio::test]
async fn waiters_wake_up_when_cancel_is_called_later() {
    let token = CancelToken::new();
    let waiter = token.clone();
    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
    });
    tokio::task::yield_now().await;
    token.cancel();
    tokio::time::timeout(Duration::from_millis(100), handle)
        .await
        .expect("waiter should wake up after cancel")
        .expect("task should not panic");
}

#[test]
fn cancel_is_idempotent() {
    let token = CancelToken::new();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
}
