//! Step definitions, fixtures, and scenarios for pagination.

mod bdd_steps;
mod scenarios;
