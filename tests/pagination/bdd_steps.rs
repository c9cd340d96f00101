//! BDD step definitions for paged collection listing.

use std::pin::pin;

use cloudreel::test_support::PagedBackend;
use cloudreel::{FetchError, PaginationError, PaginationOptions, paginate};
use futures_util::StreamExt;
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{ListOutcome, PaginationContext};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a provider collection of {count:u32} items")]
fn collection_of(mut pagination_context: PaginationContext, count: u32) -> PaginationContext {
    pagination_context.backend = PagedBackend::new(0..count);
    pagination_context
}

#[given("a provider collection that does not exist")]
fn missing_collection(mut pagination_context: PaginationContext) -> PaginationContext {
    pagination_context.backend = pagination_context.backend.missing();
    pagination_context
}

#[given("a page size of {size:u32}")]
fn page_size_of(mut pagination_context: PaginationContext, size: u32) -> PaginationContext {
    pagination_context.page_size = Some(size);
    pagination_context
}

#[given("page {page:u32} fails with a transport error")]
fn page_fails(mut pagination_context: PaginationContext, page: u32) -> PaginationContext {
    pagination_context.backend = pagination_context.backend.fail_on_page(
        page,
        FetchError::Transport {
            message: String::from("connection reset by peer"),
        },
    );
    pagination_context
}

#[when("I list the whole collection")]
fn list_collection(
    mut pagination_context: PaginationContext,
) -> Result<PaginationContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let options = PaginationOptions::builder()
        .maybe_page_size(pagination_context.page_size)
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    let fetcher = pagination_context.backend.fetcher();

    let outcome = runtime.block_on(async move {
        let listing = paginate(fetcher, options).into_stream();
        let mut stream = pin!(listing);
        let mut items = Vec::new();
        while let Some(next) = stream.next().await {
            match next {
                Ok(item) => items.push(item),
                Err(err) => {
                    return ListOutcome {
                        items,
                        error: Some(err),
                    };
                }
            }
        }
        ListOutcome { items, error: None }
    });

    pagination_context.outcome = Some(outcome);
    Ok(pagination_context)
}

fn outcome(pagination_context: &PaginationContext) -> Result<&ListOutcome, StepError> {
    pagination_context
        .outcome
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("missing outcome")))
}

#[then("{count:u32} items are yielded in provider order")]
fn items_yielded(pagination_context: &PaginationContext, count: u32) -> Result<(), StepError> {
    let listed = outcome(pagination_context)?;
    if let Some(err) = &listed.error {
        return Err(StepError::Assertion(format!(
            "expected success, got error: {err}"
        )));
    }
    let expected: Vec<u32> = (0..count).collect();
    if listed.items == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected items 0..{count}, got {:?}",
            listed.items
        )))
    }
}

#[then("the provider served {count:u32} page requests")]
fn provider_served(pagination_context: &PaginationContext, count: u32) -> Result<(), StepError> {
    let served = pagination_context.backend.fetch_count();
    if served == count as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} page requests, got {served}"
        )))
    }
}

#[then("the listing fails on page {page:u32} after yielding {count:u32} items")]
fn listing_fails(
    pagination_context: &PaginationContext,
    page: u32,
    count: u32,
) -> Result<(), StepError> {
    let listed = outcome(pagination_context)?;
    match &listed.error {
        Some(PaginationError::Fetch { page_number, .. })
            if *page_number == page && listed.items.len() == count as usize =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected failure on page {page} after {count} items, got {other:?} after {} items",
            listed.items.len()
        ))),
    }
}
