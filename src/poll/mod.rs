//! Waiting for asynchronously provisioned resources to settle.
//!
//! Cloud APIs accept create, change, and delete requests immediately and
//! report the real outcome later as a state change. [`poll_until`] fetches the
//! resource state on a fixed interval and reports exactly one
//! [`PollOutcome`]: converged, failed, or timed out. Fetch errors and
//! cancellation are surfaced separately through [`PollError`] because neither
//! says anything about the resource itself.

mod predicate;
mod waiter;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::error::FetchError;
use crate::state::StateSnapshot;

pub use predicate::{Convergence, Predicate, UnknownStatePolicy};
pub use waiter::Waiter;

/// Default interval between state fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Default overall wait budget.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Interval and budget for one wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSettings {
    interval: Duration,
    max_duration: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl PollSettings {
    /// Validates and builds poll settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] when either duration is zero.
    pub fn new(interval: Duration, max_duration: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: String::from("poll_interval"),
            });
        }
        if max_duration.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: String::from("max_duration"),
            });
        }
        Ok(Self {
            interval,
            max_duration,
        })
    }

    /// Time slept between attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wall-clock budget measured from the first fetch.
    #[must_use]
    pub const fn max_duration(&self) -> Duration {
        self.max_duration
    }
}

/// Fixed point in time after which a wait gives up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deadline {
    start: Instant,
    max_duration: Duration,
}

impl Deadline {
    /// Starts the clock now.
    #[must_use]
    pub fn start(max_duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            max_duration,
        }
    }

    /// Time elapsed since the deadline was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before expiry, clamped at zero.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.max_duration.saturating_sub(self.elapsed())
    }

    /// Returns `true` once the budget has been used up.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.max_duration
    }

    /// Instant at which the budget runs out, or `None` when it lies beyond
    /// what the clock can represent.
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.start.checked_add(self.max_duration)
    }
}

/// Terminal result of a wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PollOutcome {
    /// The target predicate matched.
    Converged {
        /// Snapshot that matched.
        snapshot: StateSnapshot,
        /// Number of fetches performed.
        attempts: u32,
    },
    /// The failure predicate matched.
    Failed {
        /// Snapshot that matched.
        snapshot: StateSnapshot,
        /// Provider failure detail, for example `FAILED_ADD`.
        reason: String,
        /// Number of fetches performed.
        attempts: u32,
    },
    /// The budget ran out while the resource was still pending.
    TimedOut {
        /// Last snapshot observed.
        last: StateSnapshot,
        /// Number of fetches performed.
        attempts: u32,
    },
}

impl PollOutcome {
    /// Number of state fetches the wait performed.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Converged { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Most recent snapshot, whichever way the wait ended.
    #[must_use]
    pub const fn snapshot(&self) -> &StateSnapshot {
        match self {
            Self::Converged { snapshot, .. } | Self::Failed { snapshot, .. } => snapshot,
            Self::TimedOut { last, .. } => last,
        }
    }

    /// Returns `true` for [`PollOutcome::Converged`].
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Folds failure and timeout into [`ConvergenceError`].
    ///
    /// # Errors
    ///
    /// Returns [`ConvergenceError::Failed`] or [`ConvergenceError::TimedOut`]
    /// for the corresponding outcomes.
    pub fn into_result(self) -> Result<StateSnapshot, ConvergenceError> {
        match self {
            Self::Converged { snapshot, .. } => Ok(snapshot),
            Self::Failed {
                snapshot, reason, ..
            } => Err(ConvergenceError::Failed {
                resource_id: snapshot.resource_id.clone(),
                reason,
                snapshot: Box::new(snapshot),
            }),
            Self::TimedOut { last, .. } => Err(ConvergenceError::TimedOut {
                resource_id: last.resource_id.clone(),
                last_state: last.state.to_string(),
                last: Box::new(last),
            }),
        }
    }
}

/// Failure and timeout outcomes expressed as errors.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConvergenceError {
    /// The resource reached a recognised terminal failure state.
    #[error("resource {resource_id} reached failure state {reason}")]
    Failed {
        /// Provider identifier of the resource.
        resource_id: String,
        /// Provider failure detail.
        reason: String,
        /// Snapshot that matched the failure predicate.
        snapshot: Box<StateSnapshot>,
    },
    /// No terminal state was reached within the budget.
    #[error("timeout waiting for resource {resource_id}; last state {last_state}")]
    TimedOut {
        /// Provider identifier of the resource.
        resource_id: String,
        /// Last observed state text.
        last_state: String,
        /// Last observed snapshot.
        last: Box<StateSnapshot>,
    },
}

/// Errors that end a wait without a verdict on the resource.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PollError {
    /// Raised when the state fetcher fails. Not retried.
    #[error("failed to fetch state of {resource_id} on attempt {attempt}: {source}")]
    Fetch {
        /// Provider identifier of the resource.
        resource_id: String,
        /// One-based attempt that failed.
        attempt: u32,
        /// Error reported by the fetcher.
        #[source]
        source: FetchError,
    },
    /// Raised when the caller's cancellation token fires.
    #[error("wait for {resource_id} cancelled after {attempts} attempts")]
    Cancelled {
        /// Provider identifier of the resource.
        resource_id: String,
        /// Fetches completed before cancellation.
        attempts: u32,
        /// Last snapshot observed, if any.
        last: Option<Box<StateSnapshot>>,
    },
}

/// Polls `fetch_state` until `convergence` reports a verdict or the budget in
/// `settings` runs out.
///
/// The first fetch happens immediately. After each pending result the poller
/// sleeps for the configured interval, shortened so that no sleep runs past
/// the deadline, and fetches again. The target predicate is evaluated before
/// the failure predicate.
///
/// # Errors
///
/// Returns [`PollError::Fetch`] as soon as a fetch fails and
/// [`PollError::Cancelled`] when `cancel` fires before or during a fetch, or
/// during a sleep. A fetch is never started once `cancel` has fired.
pub async fn poll_until<F, Fut>(
    mut fetch_state: F,
    resource_id: &str,
    convergence: &Convergence,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<PollOutcome, PollError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<StateSnapshot, FetchError>>,
{
    let deadline = Deadline::start(settings.max_duration());
    let mut attempts: u32 = 0;
    let mut last: Option<StateSnapshot> = None;

    loop {
        let attempt = attempts.saturating_add(1);
        debug!(resource_id, attempt, "fetching resource state");
        if cancel.is_cancelled() {
            return Err(cancelled(resource_id, attempts, last));
        }
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(cancelled(resource_id, attempts, last));
            }
            result = fetch_state(resource_id.to_owned()) => result,
        };
        attempts = attempt;

        let snapshot = fetched.map_err(|source| {
            warn!(resource_id, attempt, error = %source, "state fetch failed");
            PollError::Fetch {
                resource_id: resource_id.to_owned(),
                attempt,
                source,
            }
        })?;

        if convergence.target().matches(&snapshot) {
            info!(
                resource_id,
                attempts,
                state = %snapshot.state,
                target = convergence.target().label(),
                "resource converged"
            );
            return Ok(PollOutcome::Converged { snapshot, attempts });
        }

        if convergence.failure().matches(&snapshot) {
            let reason = snapshot.failure_detail();
            warn!(resource_id, attempts, %reason, "resource reached failure state");
            return Ok(PollOutcome::Failed {
                snapshot,
                reason,
                attempts,
            });
        }

        if deadline.is_expired() {
            warn!(
                resource_id,
                attempts,
                state = %snapshot.state,
                elapsed_ms = u64::try_from(deadline.elapsed().as_millis()).unwrap_or(u64::MAX),
                "timed out waiting for resource"
            );
            return Ok(PollOutcome::TimedOut {
                last: snapshot,
                attempts,
            });
        }

        debug!(resource_id, attempt, state = %snapshot.state, "resource pending");
        last = Some(snapshot);

        let nap = settings.interval().min(deadline.remaining());
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(cancelled(resource_id, attempts, last));
            }
            () = sleep(nap) => {}
        }
    }
}

fn cancelled(resource_id: &str, attempts: u32, last: Option<StateSnapshot>) -> PollError {
    warn!(resource_id, attempts, "wait cancelled");
    PollError::Cancelled {
        resource_id: resource_id.to_owned(),
        attempts,
        last: last.map(Box::new),
    }
}
