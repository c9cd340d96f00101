//! Configuration-bound helpers for the common waits.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;
use crate::state::{ProviderState, StateSnapshot};

use super::{Convergence, PollError, PollOutcome, PollSettings, UnknownStatePolicy, poll_until};

/// Carries poll settings and the unknown-state policy so call sites only name
/// the resource and what they are waiting for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Waiter {
    settings: PollSettings,
    unknown_states: UnknownStatePolicy,
}

impl Waiter {
    /// Creates a waiter that treats unrecognised states as failures.
    #[must_use]
    pub const fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            unknown_states: UnknownStatePolicy::Fail,
        }
    }

    /// Overrides the unknown-state policy.
    #[must_use]
    pub const fn with_unknown_state_policy(mut self, policy: UnknownStatePolicy) -> Self {
        self.unknown_states = policy;
        self
    }

    /// Poll settings used for every wait.
    #[must_use]
    pub const fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Unknown-state policy applied to the canned waits.
    #[must_use]
    pub const fn unknown_state_policy(&self) -> UnknownStatePolicy {
        self.unknown_states
    }

    /// Waits with caller-supplied predicates, used verbatim.
    ///
    /// # Errors
    ///
    /// Propagates [`PollError`] from [`poll_until`].
    pub async fn wait_for<F, Fut>(
        &self,
        fetch_state: F,
        resource_id: &str,
        convergence: &Convergence,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<StateSnapshot, FetchError>>,
    {
        poll_until(fetch_state, resource_id, convergence, &self.settings, cancel).await
    }

    /// Waits until the resource reports `NORMAL`.
    ///
    /// # Errors
    ///
    /// Propagates [`PollError`] from [`poll_until`].
    pub async fn wait_for_normal<F, Fut>(
        &self,
        fetch_state: F,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<StateSnapshot, FetchError>>,
    {
        let convergence = Convergence::normal().with_unknown_policy(self.unknown_states);
        self.wait_for(fetch_state, resource_id, &convergence, cancel)
            .await
    }

    /// Waits until the resource reports `DELETED` or disappears.
    ///
    /// Providers purge deleted resources, so a [`FetchError::NotFound`] from
    /// `fetch_state` reads as a `DELETED` snapshot here.
    ///
    /// # Errors
    ///
    /// Propagates [`PollError`] from [`poll_until`].
    pub async fn wait_for_deleted<F, Fut>(
        &self,
        mut fetch_state: F,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<StateSnapshot, FetchError>>,
    {
        let missing_is_deleted = |id: String| {
            let pending = fetch_state(id.clone());
            async move {
                match pending.await {
                    Err(err) if err.is_not_found() => {
                        debug!(resource_id = %id, "resource gone; treating as deleted");
                        Ok(StateSnapshot::new(id, ProviderState::Deleted))
                    }
                    other => other,
                }
            }
        };
        let convergence = Convergence::deleted().with_unknown_policy(self.unknown_states);
        self.wait_for(missing_is_deleted, resource_id, &convergence, cancel)
            .await
    }

    /// Waits until a server's `started` and `deployed` flags match.
    ///
    /// # Errors
    ///
    /// Propagates [`PollError`] from [`poll_until`].
    pub async fn wait_for_server_power<F, Fut>(
        &self,
        fetch_state: F,
        resource_id: &str,
        started: bool,
        deployed: bool,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<StateSnapshot, FetchError>>,
    {
        let convergence =
            Convergence::server_power(started, deployed).with_unknown_policy(self.unknown_states);
        self.wait_for(fetch_state, resource_id, &convergence, cancel)
            .await
    }
}
