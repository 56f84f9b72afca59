// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so phase/record timestamps are test-fakeable.
//!
//! Every "now" read in the engine (build/step/service timestamps, log
//! sequencing) goes through a `Clock` rather than `SystemTime::now()`
//! directly, so tests can assert exact `started`/`finished` values instead
//! of a wildcard range check.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, expressed as Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Real wall-clock time.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests. Starts at an arbitrary epoch and only
/// advances when told to, so assertions on `started`/`finished` ordering
/// don't race real wall-clock resolution.
pub struct FakeClock {
    now: AtomicI64,
}

impl FakeClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Advance the clock by `secs` seconds and return the new value.
    pub fn advance(&self, secs: i64) -> i64 {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
