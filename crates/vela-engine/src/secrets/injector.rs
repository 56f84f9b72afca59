// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret injector (§4.D): places resolved secret values into a
//! container's environment, subject to the secret's image/event ACLs
//! (§8 property 5).

use std::collections::HashMap;

use vela_core::{Container, Secret};

use crate::env::ENV_BUILD_EVENT;

/// Escapes newlines in a secret value so it round-trips as a single
/// environment-variable token (§4.D: "Newlines in secret values must be
/// escaped before substitution").
pub fn escape_value(value: &str) -> String {
    value.replace('\n', "\\n")
}

/// Injects matching secrets from `secrets` into `container.environment`.
/// For each `container.secrets` reference, looks up the named secret; if
/// found and it matches the container's image and `BUILD_EVENT`, places
/// the (newline-escaped) value under the upper-cased target key. A
/// missing or non-matching secret is silently skipped — no error.
pub fn inject_secrets(container: &mut Container, secrets: &HashMap<String, Secret>) {
    let event = container
        .environment
        .get(ENV_BUILD_EVENT)
        .cloned()
        .unwrap_or_default();
    let refs = container.secrets.clone();
    for secret_ref in &refs {
        let Some(secret) = secrets.get(&secret_ref.source) else {
            continue;
        };
        if !secret.matches(&container.image, &event) {
            continue;
        }
        container.environment.insert(
            secret_ref.target.to_uppercase(),
            escape_value(&secret.value),
        );
    }
}

#[cfg(test)]
#[path = "injector_tests.rs"]
mod tests;
