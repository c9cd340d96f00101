//! BDD scenarios for paged collection listing.

use rstest_bdd_macros::scenario;

use super::test_helpers::{PaginationContext, pagination_context};

#[scenario(
    path = "tests/features/pagination.feature",
    name = "Walk a collection across several pages"
)]
fn scenario_walk_several_pages(pagination_context: PaginationContext) {
    let _ = pagination_context;
}

#[scenario(
    path = "tests/features/pagination.feature",
    name = "Treat a missing collection as empty"
)]
fn scenario_missing_collection(pagination_context: PaginationContext) {
    let _ = pagination_context;
}

#[scenario(
    path = "tests/features/pagination.feature",
    name = "Stop at the first failing page"
)]
fn scenario_stop_at_failing_page(pagination_context: PaginationContext) {
    let _ = pagination_context;
}

#[scenario(
    path = "tests/features/pagination.feature",
    name = "Defer to the provider page size"
)]
fn scenario_provider_page_size(pagination_context: PaginationContext) {
    let _ = pagination_context;
}
