//! BDD step definitions for convergence waits.

use std::time::Duration;

use cloudreel::test_support::ScriptedStates;
use cloudreel::{CancellationToken, PollOutcome, PollSettings, UnknownStatePolicy, Waiter};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{ConvergenceContext, RESOURCE_ID, paused_runtime};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a poll interval of {interval:u32} seconds and a budget of {budget:u32} seconds")]
fn poll_budget(
    mut convergence_context: ConvergenceContext,
    interval: u32,
    budget: u32,
) -> Result<ConvergenceContext, StepError> {
    convergence_context.settings = PollSettings::new(
        Duration::from_secs(u64::from(interval)),
        Duration::from_secs(u64::from(budget)),
    )
    .map_err(|err| StepError::Assertion(err.to_string()))?;
    Ok(convergence_context)
}

#[given("a resource reporting states \"{states}\"")]
fn resource_reporting(
    mut convergence_context: ConvergenceContext,
    states: String,
) -> ConvergenceContext {
    convergence_context.states = ScriptedStates::with_states(
        RESOURCE_ID,
        states.split(',').map(str::trim).filter(|state| !state.is_empty()),
    );
    convergence_context
}

#[given("unrecognised states keep polling")]
fn keep_polling_on_unknown(mut convergence_context: ConvergenceContext) -> ConvergenceContext {
    convergence_context.unknown_states = UnknownStatePolicy::KeepPolling;
    convergence_context
}

#[derive(Clone, Copy)]
enum Target {
    Normal,
    Deleted,
}

fn run_wait(
    mut convergence_context: ConvergenceContext,
    target: Target,
) -> Result<ConvergenceContext, StepError> {
    let runtime = paused_runtime().map_err(|err| StepError::Assertion(err.to_string()))?;
    let waiter = Waiter::new(convergence_context.settings)
        .with_unknown_state_policy(convergence_context.unknown_states);
    let fetcher = convergence_context.states.fetcher();
    let cancel = CancellationToken::new();

    let result = runtime.block_on(async move {
        match target {
            Target::Normal => waiter.wait_for_normal(fetcher, RESOURCE_ID, &cancel).await,
            Target::Deleted => waiter.wait_for_deleted(fetcher, RESOURCE_ID, &cancel).await,
        }
    });

    convergence_context.outcome = Some(result);
    Ok(convergence_context)
}

#[when("I wait for the resource to become normal")]
fn wait_normal(convergence_context: ConvergenceContext) -> Result<ConvergenceContext, StepError> {
    run_wait(convergence_context, Target::Normal)
}

#[when("I wait for the resource to be deleted")]
fn wait_deleted(convergence_context: ConvergenceContext) -> Result<ConvergenceContext, StepError> {
    run_wait(convergence_context, Target::Deleted)
}

fn outcome(convergence_context: &ConvergenceContext) -> Result<&PollOutcome, StepError> {
    match convergence_context.outcome.as_ref() {
        Some(Ok(outcome)) => Ok(outcome),
        Some(Err(err)) => Err(StepError::Assertion(format!(
            "expected a verdict, got error: {err}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

fn check_attempts(actual: u32, expected: u32) -> Result<(), StepError> {
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected} attempts, got {actual}"
        )))
    }
}

#[then("the wait converges after {attempts:u32} attempts")]
fn converges(convergence_context: &ConvergenceContext, attempts: u32) -> Result<(), StepError> {
    let verdict = outcome(convergence_context)?;
    if !verdict.is_converged() {
        return Err(StepError::Assertion(format!(
            "expected convergence, got {verdict:?}"
        )));
    }
    check_attempts(verdict.attempts(), attempts)
}

#[then("the wait fails with reason \"{reason}\" after {attempts:u32} attempts")]
fn fails_with(
    convergence_context: &ConvergenceContext,
    reason: String,
    attempts: u32,
) -> Result<(), StepError> {
    let verdict = outcome(convergence_context)?;
    let PollOutcome::Failed {
        reason: actual, ..
    } = verdict
    else {
        return Err(StepError::Assertion(format!(
            "expected failure, got {verdict:?}"
        )));
    };
    if *actual != reason {
        return Err(StepError::Assertion(format!(
            "expected reason {reason}, got {actual}"
        )));
    }
    check_attempts(verdict.attempts(), attempts)
}

#[then("the wait times out after {attempts:u32} attempts with last state \"{state}\"")]
fn times_out(
    convergence_context: &ConvergenceContext,
    attempts: u32,
    state: String,
) -> Result<(), StepError> {
    let verdict = outcome(convergence_context)?;
    let PollOutcome::TimedOut { last, .. } = verdict else {
        return Err(StepError::Assertion(format!(
            "expected timeout, got {verdict:?}"
        )));
    };
    if last.state.as_str() != state {
        return Err(StepError::Assertion(format!(
            "expected last state {state}, got {}",
            last.state
        )));
    }
    check_attempts(verdict.attempts(), attempts)
}
