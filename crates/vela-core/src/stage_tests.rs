// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_stage_has_no_needs() {
    let s = Stage::new("build");
    assert!(s.needs.is_empty());
    assert!(s.steps.is_empty());
    assert!(!s.is_init());
}
