// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::container::Container;
use crate::pipeline::Pipeline;
use crate::secret::{Secret, SecretEngine, SecretType};
use crate::service::Service;
use crate::stage::Stage;
use crate::step::Step;

/// An `init` step, the first element every well-formed pipeline carries.
pub fn init_step() -> Step {
    Step::new(Container::new("init", "init", 1))
}

/// A plain step with the given name/number and an `echo` command.
pub fn step(id: &str, name: &str, number: u32, image: &str) -> Step {
    let mut c = Container::new(id, name, number);
    c.image = image.to_string();
    Step::new(c)
}

/// A service sidecar with the given name/number.
pub fn service(id: &str, name: &str, number: u32, image: &str) -> Service {
    let mut c = Container::new(id, name, number);
    c.image = image.to_string();
    Service::new(c)
}

/// A non-plugin secret resolved by name/key.
pub fn repo_secret(name: &str, key: &str, value: &str) -> Secret {
    Secret {
        name: name.to_string(),
        engine: SecretEngine::Native,
        kind: SecretType::Repo,
        key: key.to_string(),
        value: value.to_string(),
        images: Vec::new(),
        events: Vec::new(),
        origin: None,
    }
}

/// The "steps pipeline, basic success" fixture from spec §8: services =
/// [postgres], steps = [init, clone, echo], echo runs `echo ${FOOBAR}`,
/// secret foobar=hello.
pub fn basic_steps_pipeline() -> Pipeline {
    let mut echo = step("echo", "echo", 3, "alpine:latest");
    echo.commands = vec!["echo ${FOOBAR}".to_string()];
    echo.secrets.push(crate::container::SecretRef {
        source: "foobar".to_string(),
        target: "foobar".to_string(),
    });

    Pipeline {
        id: "p1".to_string(),
        services: vec![service("postgres", "postgres", 1, "postgres:13")],
        steps: vec![
            init_step(),
            step("clone", "clone", 2, "target/vela-git-slim:latest"),
            echo,
        ],
        stages: Vec::new(),
        secrets: vec![repo_secret("foobar", "octo/repo/foobar", "hello")],
    }
}

/// The "stages pipeline, parallel" fixture from spec §8: `clone` (no
/// needs), `exit` (needs clone, continue=true, `exit 1`), `echo` (needs
/// clone).
pub fn parallel_stages_pipeline() -> Pipeline {
    let mut clone_stage = Stage::new("clone");
    clone_stage
        .steps
        .push(step("clone", "clone", 1, "target/vela-git-slim:latest"));

    let mut exit_stage = Stage::new("exit");
    exit_stage.needs = vec!["clone".to_string()];
    let mut exit_step = step("exit", "exit", 1, "alpine:latest");
    exit_step.commands = vec!["exit 1".to_string()];
    exit_step.ruleset.continue_on_failure = true;
    exit_stage.steps.push(exit_step);

    let mut echo_stage = Stage::new("echo");
    echo_stage.needs = vec!["clone".to_string()];
    echo_stage
        .steps
        .push(step("echo", "echo", 1, "alpine:latest"));

    Pipeline {
        id: "p2".to_string(),
        services: Vec::new(),
        steps: vec![init_step()],
        stages: vec![clone_stage, exit_stage, echo_stage],
        secrets: Vec::new(),
    }
}
