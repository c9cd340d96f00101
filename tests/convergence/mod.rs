//! Step definitions, fixtures, and scenarios for convergence waits.

mod bdd_steps;
mod scenarios;
mod test_helpers;
