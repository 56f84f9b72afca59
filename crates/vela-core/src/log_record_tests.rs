// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn append_grows_buffer() {
    let mut log = LogRecord::new("step-1");
    log.append(b"hello ");
    log.append(b"world");
    assert_eq!(log.data(), b"hello world");
}

#[test]
fn append_line_adds_trailing_newline() {
    let mut log = LogRecord::new("init");
    log.append_line("Inspecting runtime network");
    log.append_line("Inspecting runtime volume");
    assert_eq!(
        log.data(),
        b"Inspecting runtime network\nInspecting runtime volume\n".as_slice()
    );
}

#[test]
fn overwrite_replaces_entire_buffer() {
    let mut log = LogRecord::new("step-1");
    log.append(b"partial");
    log.overwrite(b"full output".to_vec());
    assert_eq!(log.data(), b"full output");
}
