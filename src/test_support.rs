//! Test support utilities shared across unit and integration tests.
//!
//! The doubles here stand in for provider fetch functions. Each one records
//! every call so tests can assert on the exact number and order of fetches.

use std::collections::VecDeque;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::FetchError;
use crate::pagination::{Page, PageRequest};
use crate::state::StateSnapshot;

/// Page size a [`PagedBackend`] uses when the request leaves it unset.
pub const PROVIDER_DEFAULT_PAGE_SIZE: u32 = 250;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn exhausted(kind: &str) -> FetchError {
    FetchError::Transport {
        message: format!("no scripted {kind} response left"),
    }
}

/// In-memory collection served page by page, the way a provider would.
#[derive(Clone, Debug)]
pub struct PagedBackend<T> {
    inner: Arc<Mutex<BackendState<T>>>,
}

#[derive(Debug)]
struct BackendState<T> {
    items: Vec<T>,
    report_total: bool,
    missing: bool,
    failures: Vec<(u32, FetchError)>,
    requests: Vec<PageRequest>,
}

impl<T: Clone> PagedBackend<T> {
    /// Serves `items` and reports the total count on every page.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BackendState {
                items: items.into_iter().collect(),
                report_total: true,
                missing: false,
                failures: Vec::new(),
                requests: Vec::new(),
            })),
        }
    }

    /// Stops reporting the total count, leaving only page fullness as a
    /// signal.
    #[must_use]
    pub fn without_total(self) -> Self {
        lock(&self.inner).report_total = false;
        self
    }

    /// Makes every fetch report that the collection does not exist.
    #[must_use]
    pub fn missing(self) -> Self {
        lock(&self.inner).missing = true;
        self
    }

    /// Makes the fetch of `page_number` fail with `error`.
    #[must_use]
    pub fn fail_on_page(self, page_number: u32, error: FetchError) -> Self {
        lock(&self.inner).failures.push((page_number, error));
        self
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<PageRequest> {
        lock(&self.inner).requests.clone()
    }

    /// Number of fetches received so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        lock(&self.inner).requests.len()
    }

    /// Serves one request.
    ///
    /// # Errors
    ///
    /// Returns the configured not-found or page failure.
    pub fn serve(&self, request: PageRequest) -> Result<Page<T>, FetchError> {
        let mut state = lock(&self.inner);
        let page_number = request.page_number();
        let size = request
            .options
            .explicit_page_size()
            .unwrap_or(PROVIDER_DEFAULT_PAGE_SIZE);
        state.requests.push(request);

        if state.missing {
            return Err(FetchError::NotFound {
                resource: String::from("collection"),
            });
        }
        if let Some((_, error)) = state
            .failures
            .iter()
            .find(|(page, _)| *page == page_number)
        {
            return Err(error.clone());
        }

        let size_usize = usize::try_from(size).unwrap_or(usize::MAX);
        let skip = usize::try_from(page_number.saturating_sub(1))
            .unwrap_or(usize::MAX)
            .saturating_mul(size_usize);
        let items: Vec<T> = state
            .items
            .iter()
            .skip(skip)
            .take(size_usize)
            .cloned()
            .collect();
        let page = Page::new(items, page_number, size);
        if state.report_total {
            let total = u64::try_from(state.items.len()).unwrap_or(u64::MAX);
            return Ok(page.with_total_count(total));
        }
        Ok(page)
    }

    /// Returns a page fetch function backed by this collection.
    #[must_use]
    pub fn fetcher(
        &self,
    ) -> impl FnMut(PageRequest) -> Ready<Result<Page<T>, FetchError>> + use<T> {
        let backend = self.clone();
        move |request| ready(backend.serve(request))
    }
}

/// Page fetcher that replays pre-seeded responses in FIFO order.
#[derive(Clone, Debug)]
pub struct ScriptedPages<T> {
    inner: Arc<Mutex<ScriptState<Page<T>, PageRequest>>>,
}

/// State fetcher that replays pre-seeded snapshots in FIFO order. The final
/// response repeats once the script runs out, so a pending resource stays
/// pending.
#[derive(Clone, Debug)]
pub struct ScriptedStates {
    inner: Arc<Mutex<ScriptState<StateSnapshot, String>>>,
}

#[derive(Debug)]
struct ScriptState<R, Q> {
    responses: VecDeque<Result<R, FetchError>>,
    last: Option<Result<R, FetchError>>,
    calls: Vec<Q>,
}

impl<R, Q> Default for ScriptState<R, Q> {
    fn default() -> Self {
        Self {
            responses: VecDeque::new(),
            last: None,
            calls: Vec::new(),
        }
    }
}

impl<T: Clone> Default for ScriptedPages<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptState::default())),
        }
    }
}

impl<T: Clone> ScriptedPages<T> {
    /// Creates a fetcher with no queued pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page.
    pub fn push_page(&self, page: Page<T>) {
        lock(&self.inner).responses.push_back(Ok(page));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: FetchError) {
        lock(&self.inner).responses.push_back(Err(error));
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<PageRequest> {
        lock(&self.inner).calls.clone()
    }

    /// Number of fetches received so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    /// Returns a page fetch function replaying the script.
    #[must_use]
    pub fn fetcher(
        &self,
    ) -> impl FnMut(PageRequest) -> Ready<Result<Page<T>, FetchError>> + use<T> {
        let script = self.clone();
        move |request| {
            let mut state = lock(&script.inner);
            state.calls.push(request);
            ready(
                state
                    .responses
                    .pop_front()
                    .unwrap_or_else(|| Err(exhausted("page"))),
            )
        }
    }
}

impl Default for ScriptedStates {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptState::default())),
        }
    }
}

impl ScriptedStates {
    /// Creates a fetcher with no queued snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues snapshots for `resource_id` with the given raw states.
    #[must_use]
    pub fn with_states<'a>(resource_id: &str, states: impl IntoIterator<Item = &'a str>) -> Self {
        let script = Self::new();
        for state in states {
            script.push_snapshot(StateSnapshot::new(resource_id, state));
        }
        script
    }

    /// Queues a snapshot.
    pub fn push_snapshot(&self, snapshot: StateSnapshot) {
        lock(&self.inner).responses.push_back(Ok(snapshot));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: FetchError) {
        lock(&self.inner).responses.push_back(Err(error));
    }

    /// Resource identifiers requested so far, one per fetch.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.inner).calls.clone()
    }

    /// Number of fetches received so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    /// Returns a state fetch function replaying the script.
    #[must_use]
    pub fn fetcher(
        &self,
    ) -> impl FnMut(String) -> Ready<Result<StateSnapshot, FetchError>> + use<> {
        let script = self.clone();
        move |resource_id| {
            let mut state = lock(&script.inner);
            state.calls.push(resource_id);
            let next = match state.responses.pop_front() {
                Some(response) => {
                    state.last = Some(response.clone());
                    response
                }
                None => state.last.clone().unwrap_or_else(|| Err(exhausted("state"))),
            };
            ready(next)
        }
    }
}
