//! BDD scenarios for convergence waits.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ConvergenceContext, convergence_context};

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Resource is already normal"
)]
fn scenario_already_normal(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Creation fails permanently"
)]
fn scenario_creation_fails(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Budget runs out while pending"
)]
fn scenario_budget_runs_out(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Unrecognised states fail by default"
)]
fn scenario_unknown_fails(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Unrecognised states are tolerated when configured"
)]
fn scenario_unknown_tolerated(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}

#[scenario(
    path = "tests/features/convergence.feature",
    name = "Deletion completes"
)]
fn scenario_deletion_completes(convergence_context: ConvergenceContext) {
    let _ = convergence_context;
}
