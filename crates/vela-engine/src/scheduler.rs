// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage scheduler (§4.H): parallel execution of a pipeline's non-init
//! stages, bounded only by the `needs` DAG. Per-stage signaling is a
//! single-writer `tokio::sync::watch<Option<EngineError>>` channel that
//! closes (all senders dropped) to broadcast "this stage is done", with the
//! channel's last value carrying an optional error.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use vela_core::{BuildStatus, RecordStatus, Stage};
use vela_runtime::{ContainerRuntime, ProcessSignaler, VelaClient};

use crate::cancel::CancelToken;
use crate::engine::Engine;
use crate::error::EngineError;

type StageReceiver = watch::Receiver<Option<EngineError>>;
type StageSender = watch::Sender<Option<EngineError>>;

/// Waits on one stage's channel until it closes (the stage finished),
/// racing against the shared cancellation token (§4.H PlanStage: "wait
/// until either the channel delivers a value or the group context is
/// canceled"). Returns the stage's propagated error, if any.
async fn wait_for_stage(rx: &mut StageReceiver, cancel: &CancelToken) -> Result<(), EngineError> {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(EngineError::Cancelled),
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    match &*rx.borrow() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// PlanStage (§4.H): waits for every stage `s.needs` to close its channel.
/// A dependency name missing from `signals` is treated as already
/// satisfied. Propagates the first non-nil error observed; cancellation
/// surfaces as [`EngineError::Cancelled`].
async fn plan_stage(
    stage: &Stage,
    signals: &HashMap<String, StageReceiver>,
    cancel: &CancelToken,
) -> Result<(), EngineError> {
    for needed in &stage.needs {
        let Some(rx) = signals.get(needed) else {
            continue;
        };
        let mut rx = rx.clone();
        wait_for_stage(&mut rx, cancel).await?;
    }
    Ok(())
}

/// ExecStage (§4.H): runs a stage's steps strictly sequentially, skipping
/// any whose ruleset rejects the current trigger metadata. `create_step`/
/// `plan_step`/`exec_step` already finalize the record (terminal status
/// inference happens in `snapshot_step`); this only reads the outcome back
/// to decide whether to stop the stage and fail the build. A non-continuing
/// step failure short-circuits the rest of the stage.
async fn exec_stage<R, C, S>(engine: &Arc<Engine<R, C, S>>, stage: &Stage) -> Result<(), EngineError>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    for step in &stage.steps {
        let rule_data = engine.rule_data();
        if !step.ruleset.evaluate(&rule_data) {
            continue;
        }

        let container = engine.prepared_step(&step.container).await?;
        engine.plan_step(&container).await?;
        engine.exec_step(container.clone()).await?;

        if container.detach {
            continue;
        }

        let record = engine.step_records.load(container.id.as_str())?;
        let failed = matches!(record.status, RecordStatus::Failure | RecordStatus::Killed);
        if failed && !step.ruleset.continue_on_failure {
            engine.build.lock().status = BuildStatus::Failure;
            return Err(EngineError::Validation(format!(
                "step {} exited {}",
                step.name, record.exit_code
            )));
        }
    }
    Ok(())
}

/// Runs every non-init stage of `engine`'s pipeline to completion,
/// respecting the `needs` DAG (§4.H). The first stage error cancels the
/// shared token so in-flight stages unblock (via their `needs` wait) and
/// observe the failure; every stage still closes its channel so dependents
/// never deadlock (§8 property 2, "missing dependency" and "stages
/// pipeline, parallel" scenarios).
pub async fn run_stages<R, C, S>(engine: Arc<Engine<R, C, S>>) -> Result<(), EngineError>
where
    R: ContainerRuntime,
    C: VelaClient,
    S: ProcessSignaler,
{
    let stages: Vec<Stage> = engine.pipeline().non_init_stages().cloned().collect();
    if stages.is_empty() {
        return Ok(());
    }

    let mut receivers: HashMap<String, StageReceiver> = HashMap::new();
    let mut senders: Vec<(Stage, StageSender)> = Vec::with_capacity(stages.len());
    for stage in stages {
        let (tx, rx) = watch::channel(None);
        receivers.insert(stage.name.clone(), rx);
        senders.push((stage, tx));
    }

    let mut handles = Vec::with_capacity(senders.len());
    for (stage, sender) in senders {
        let engine = Arc::clone(&engine);
        let signals = receivers.clone();
        handles.push(tokio::spawn(async move {
            let outcome = async {
                plan_stage(&stage, &signals, engine.cancel_token()).await?;
                exec_stage(&engine, &stage).await
            }
            .await;
            let _ = sender.send(outcome.clone().err());
            outcome
        }));
    }

    let mut first_err = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if first_err.is_none() {
                    first_err = Some(err.clone());
                }
                engine.record_err(err);
            }
            Err(join_err) => {
                let err = EngineError::Runtime(join_err.to_string());
                if first_err.is_none() {
                    first_err = Some(err.clone());
                }
                engine.record_err(err);
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
