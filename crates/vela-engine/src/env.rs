// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default environment variable names and `${VAR}` substitution (§4.E
//! CreateStep: "Substitute environment variables inside the container's
//! own configuration").

use std::collections::HashMap;

use vela_core::Container;

pub const ENV_BUILD_HOST: &str = "BUILD_HOST";
pub const ENV_VELA_HOST: &str = "VELA_HOST";
pub const ENV_VELA_VERSION: &str = "VELA_VERSION";
pub const ENV_VELA_RUNTIME: &str = "VELA_RUNTIME";
pub const ENV_VELA_DISTRIBUTION: &str = "VELA_DISTRIBUTION";
pub const ENV_BUILD_EVENT: &str = "BUILD_EVENT";

/// The version string reported in `VELA_VERSION`. Not wired to a build
/// script/`CARGO_PKG_VERSION` since the engine has no release process of
/// its own yet.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Populates the default environment every container receives (§4.E,
/// §6 "Environment injected into every container") before any
/// build/repo/step-library environment or secret injection happens.
pub fn apply_default_environment(
    container: &mut Container,
    hostname: &str,
    runtime_driver: &str,
    distribution: &str,
) {
    container
        .environment
        .entry(ENV_BUILD_HOST.to_string())
        .or_insert_with(|| hostname.to_string());
    container
        .environment
        .entry(ENV_VELA_HOST.to_string())
        .or_insert_with(|| hostname.to_string());
    container
        .environment
        .entry(ENV_VELA_VERSION.to_string())
        .or_insert_with(|| ENGINE_VERSION.to_string());
    container
        .environment
        .entry(ENV_VELA_RUNTIME.to_string())
        .or_insert_with(|| runtime_driver.to_string());
    container
        .environment
        .entry(ENV_VELA_DISTRIBUTION.to_string())
        .or_insert_with(|| distribution.to_string());
}

/// Expands `${VAR}` references in `image`/`commands`/`ports` against the
/// container's own `environment` map. Unresolved references are left
/// untouched rather than replaced with an empty string, matching shell
/// behavior for an undeclared variable in a best-effort substitution pass.
pub fn substitute_environment(container: &mut Container) {
    let env = container.environment.clone();
    container.image = substitute(&container.image, &env);
    for cmd in &mut container.commands {
        *cmd = substitute(cmd, &env);
    }
    for port in &mut container.ports {
        *port = substitute(port, &env);
    }
}

fn substitute(input: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' && input[i + 1..].starts_with('{') {
            if let Some(end) = input[i + 2..].find('}') {
                let span_end = i + 2 + end + 1;
                let name = &input[i + 2..i + 2 + end];
                match env.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&input[i..span_end]),
                }
                while matches!(chars.peek(), Some(&(j, _)) if j < span_end) {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
