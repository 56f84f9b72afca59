// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn container_with(env: &[(&str, &str)]) -> Container {
    let mut c = Container::new("c1", "echo", 1);
    for (k, v) in env {
        c.environment.insert(k.to_string(), v.to_string());
    }
    c
}

#[test]
fn default_environment_sets_every_field_once() {
    let mut c = Container::new("c1", "echo", 1);
    apply_default_environment(&mut c, "worker-1", "docker", "linux");
    assert_eq!(c.environment.get(ENV_BUILD_HOST).unwrap(), "worker-1");
    assert_eq!(c.environment.get(ENV_VELA_HOST).unwrap(), "worker-1");
    assert_eq!(c.environment.get(ENV_VELA_RUNTIME).unwrap(), "docker");
    assert_eq!(c.environment.get(ENV_VELA_DISTRIBUTION).unwrap(), "linux");
}

#[test]
fn default_environment_does_not_overwrite_existing_values() {
    let mut c = container_with(&[(ENV_BUILD_HOST, "preset")]);
    apply_default_environment(&mut c, "worker-1", "docker", "linux");
    assert_eq!(c.environment.get(ENV_BUILD_HOST).unwrap(), "preset");
}

#[test]
fn substitution_expands_commands_and_image() {
    let mut c = container_with(&[("FOOBAR", "hello")]);
    c.image = "alpine:${FOOBAR}".to_string();
    c.commands = vec!["echo ${FOOBAR}".to_string()];
    substitute_environment(&mut c);
    assert_eq!(c.image, "alpine:hello");
    assert_eq!(c.commands[0], "echo hello");
}

#[test]
fn substitution_leaves_unresolved_references_untouched() {
    let mut c = Container::new("c1", "echo", 1);
    c.commands = vec!["echo ${MISSING}".to_string()];
    substitute_environment(&mut c);
    assert_eq!(c.commands[0], "echo ${MISSING}");
}

#[test]
fn substitution_handles_multiple_references_in_one_string() {
    let mut c = container_with(&[("A", "1"), ("B", "2")]);
    c.commands = vec!["echo ${A}-${B}".to_string()];
    substitute_environment(&mut c);
    assert_eq!(c.commands[0], "echo 1-2");
}
