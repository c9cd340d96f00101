//! Lazy traversal of paged list operations.
//!
//! [`paginate`] turns a provider's "fetch one page" function into a single
//! forward-only [`Stream`] of items. Pages are requested strictly in order and
//! only when the consumer has drained the previous one, so a consumer that
//! stops early never pays for pages it did not look at.

mod options;
mod page;

use std::collections::VecDeque;
use std::future::Future;

use futures_util::stream::{self, Stream, TryStreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FetchError;

pub use options::{
    MAX_PAGE_SIZE, Marker, ORDER_BY_PARAM, PAGE_NUMBER_PARAM, PAGE_SIZE_PARAM, PageRequest,
    PaginationOptions, PaginationOptionsBuilder,
};
pub use page::Page;

/// Errors surfaced while traversing a paged collection.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PaginationError {
    /// Raised when a page after the first cannot be fetched, or when the
    /// first page fails for any reason other than not-found.
    #[error("failed to fetch page {page_number}: {source}")]
    Fetch {
        /// Page number whose fetch failed.
        page_number: u32,
        /// Error reported by the fetcher.
        #[source]
        source: FetchError,
    },
    /// Raised when the caller's cancellation token fires mid-traversal.
    #[error("pagination cancelled before page {page_number}")]
    Cancelled {
        /// Page number that was about to be fetched.
        page_number: u32,
    },
}

/// Builder-style handle over a single traversal.
///
/// Each call to [`paginate`] starts a brand-new traversal from the configured
/// page; a partially consumed stream cannot be rewound.
#[derive(Debug)]
pub struct Paginator<F> {
    fetch: F,
    options: PaginationOptions,
    cancel: Option<CancellationToken>,
}

/// Starts a traversal over `fetch` beginning at `options`.
#[must_use]
pub const fn paginate<F>(fetch: F, options: PaginationOptions) -> Paginator<F> {
    Paginator {
        fetch,
        options,
        cancel: None,
    }
}

struct Cursor<F, T> {
    fetch: F,
    next: Option<PageRequest>,
    buffered: VecDeque<T>,
    fetched_pages: u32,
    seen_items: u64,
    cancel: Option<CancellationToken>,
}

impl<F> Paginator<F> {
    /// Ends the traversal with [`PaginationError::Cancelled`] once `token` is
    /// cancelled. Items already yielded are unaffected.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Options the first page will be requested with.
    #[must_use]
    pub const fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// Converts the traversal into a lazy stream of items.
    pub fn into_stream<T, Fut>(self) -> impl Stream<Item = Result<T, PaginationError>>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>, FetchError>>,
    {
        let cursor = Cursor {
            fetch: self.fetch,
            next: Some(PageRequest::first(self.options)),
            buffered: VecDeque::new(),
            fetched_pages: 0,
            seen_items: 0,
            cancel: self.cancel,
        };

        stream::try_unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(item) = cursor.buffered.pop_front() {
                    return Ok(Some((item, cursor)));
                }
                let Some(request) = cursor.next.take() else {
                    return Ok(None);
                };
                let Some(page) = cursor.advance(request).await? else {
                    return Ok(None);
                };
                cursor.buffered = page.into();
            }
        })
    }

    /// Drains the traversal into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first [`PaginationError`] raised by the traversal.
    pub async fn collect_all<T, Fut>(self) -> Result<Vec<T>, PaginationError>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>, FetchError>>,
    {
        self.into_stream().try_collect().await
    }
}

impl<F, T, Fut> Cursor<F, T>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, FetchError>>,
{
    /// Fetches `request` and schedules the following page when one exists.
    /// Returns `None` when the first page reports not-found.
    async fn advance(&mut self, request: PageRequest) -> Result<Option<Vec<T>>, PaginationError> {
        let page_number = request.page_number();
        let first = self.fetched_pages == 0;
        debug!(page_number, marker = ?request.marker, "fetching page");

        let token = self.cancel.clone().unwrap_or_default();
        if token.is_cancelled() {
            warn!(page_number, "pagination cancelled");
            return Err(PaginationError::Cancelled { page_number });
        }
        let fetched = tokio::select! {
            biased;
            () = token.cancelled() => {
                warn!(page_number, "pagination cancelled");
                return Err(PaginationError::Cancelled { page_number });
            }
            result = (self.fetch)(request.clone()) => result,
        };
        self.fetched_pages = self.fetched_pages.saturating_add(1);

        let page = match fetched {
            Ok(page) => page,
            Err(err) if first && err.is_not_found() => {
                warn!(page_number, error = %err, "collection not found; treating as empty");
                return Ok(None);
            }
            Err(source) => {
                warn!(page_number, error = %source, "page fetch failed");
                return Err(PaginationError::Fetch {
                    page_number,
                    source,
                });
            }
        };

        let received = u64::try_from(page.items.len()).unwrap_or(u64::MAX);
        self.seen_items = self.seen_items.saturating_add(received);

        if page.has_more(&request.options, self.seen_items) {
            self.next = Some(PageRequest {
                options: request.options.next_page(),
                marker: page.next_marker.clone(),
            });
        } else {
            info!(
                pages = self.fetched_pages,
                total_count = ?page.total_count,
                "reached end of collection"
            );
        }

        debug!(page_number, items = page.items.len(), "page fetched");
        Ok(Some(page.items))
    }
}
