//! Shared fixtures for convergence BDD scenarios.

use cloudreel::test_support::ScriptedStates;
use cloudreel::{PollError, PollOutcome, PollSettings, UnknownStatePolicy};
use rstest::fixture;
use tokio::runtime::{Builder, Runtime};

pub const RESOURCE_ID: &str = "vip-node-1";

#[derive(Clone, Debug)]
pub struct ConvergenceContext {
    pub states: ScriptedStates,
    pub settings: PollSettings,
    pub unknown_states: UnknownStatePolicy,
    pub outcome: Option<Result<PollOutcome, PollError>>,
}

#[fixture]
pub fn convergence_context() -> ConvergenceContext {
    ConvergenceContext {
        states: ScriptedStates::new(),
        settings: PollSettings::default(),
        unknown_states: UnknownStatePolicy::Fail,
        outcome: None,
    }
}

/// Single-threaded runtime whose clock auto-advances through sleeps.
pub fn paused_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
}
