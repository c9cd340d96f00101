//! Convergence predicates and the canned criteria built from them.

use std::fmt;
use std::sync::Arc;

use crate::state::{ProviderState, StateSnapshot};

type Check = dyn Fn(&StateSnapshot) -> bool + Send + Sync;

/// Cloneable test over a [`StateSnapshot`].
#[derive(Clone)]
pub struct Predicate {
    label: String,
    check: Arc<Check>,
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.label).finish()
    }
}

impl Predicate {
    /// Wraps an arbitrary check. `label` appears in logs and `Debug` output.
    #[must_use]
    pub fn new<F>(label: impl Into<String>, check: F) -> Self
    where
        F: Fn(&StateSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Human-readable description of the predicate.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, snapshot: &StateSnapshot) -> bool {
        (self.check)(snapshot)
    }

    /// Matches every snapshot.
    #[must_use]
    pub fn always() -> Self {
        Self::new("always", |_| true)
    }

    /// Matches no snapshot.
    #[must_use]
    pub fn never() -> Self {
        Self::new("never", |_| false)
    }

    /// Matches when the parsed state equals `expected`.
    #[must_use]
    pub fn state_is(expected: ProviderState) -> Self {
        let label = format!("state == {expected}");
        Self::new(label, move |snapshot| snapshot.state == expected)
    }

    /// Matches when the raw state text equals `expected` exactly.
    #[must_use]
    pub fn raw_state_is(expected: impl Into<String>) -> Self {
        let wanted: String = expected.into();
        Self::new(format!("state == {wanted}"), move |snapshot| {
            snapshot.state.as_str() == wanted
        })
    }

    /// Matches when the raw state text starts with `prefix`.
    #[must_use]
    pub fn raw_state_starts_with(prefix: impl Into<String>) -> Self {
        let head: String = prefix.into();
        Self::new(format!("state starts with {head}"), move |snapshot| {
            snapshot.state.as_str().starts_with(head.as_str())
        })
    }

    /// Matches when the boolean attribute `name` equals `expected`. Absent
    /// attributes never match.
    #[must_use]
    pub fn flag_is(name: impl Into<String>, expected: bool) -> Self {
        let field: String = name.into();
        Self::new(format!("{field} == {expected}"), move |snapshot| {
            snapshot.flag(&field) == Some(expected)
        })
    }

    /// Matches any `FAILED_*` state and `REQUIRES_SUPPORT`.
    #[must_use]
    pub fn any_failed() -> Self {
        Self::new("state is FAILED_*/REQUIRES_SUPPORT", |snapshot| {
            snapshot.state.is_failed()
        })
    }

    /// Matches states this crate does not recognise.
    #[must_use]
    pub fn unrecognized() -> Self {
        Self::new("state is unrecognized", |snapshot| {
            snapshot.state.is_unrecognized()
        })
    }

    /// Both predicates must match.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let label = format!("({} AND {})", self.label, other.label);
        Self::new(label, move |snapshot| {
            self.matches(snapshot) && other.matches(snapshot)
        })
    }

    /// Either predicate may match.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let label = format!("({} OR {})", self.label, other.label);
        Self::new(label, move |snapshot| {
            self.matches(snapshot) || other.matches(snapshot)
        })
    }

    /// Inverts the predicate.
    #[must_use]
    pub fn negate(self) -> Self {
        let label = format!("NOT {}", self.label);
        Self::new(label, move |snapshot| !self.matches(snapshot))
    }
}

/// What to do when the provider reports a state this crate cannot parse.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UnknownStatePolicy {
    /// Report the unrecognised state as a failure.
    #[default]
    Fail,
    /// Keep polling until the target is reached or the deadline passes.
    KeepPolling,
}

/// Target and failure predicates for one wait.
#[derive(Clone, Debug)]
pub struct Convergence {
    target: Predicate,
    failure: Predicate,
}

impl Convergence {
    /// Combines a target and a failure predicate verbatim.
    #[must_use]
    pub const fn new(target: Predicate, failure: Predicate) -> Self {
        Self { target, failure }
    }

    /// Default failure predicate: any `FAILED_*` state, plus unrecognised
    /// states when `policy` is [`UnknownStatePolicy::Fail`].
    #[must_use]
    pub fn failure_for(policy: UnknownStatePolicy) -> Predicate {
        match policy {
            UnknownStatePolicy::Fail => Predicate::any_failed().or(Predicate::unrecognized()),
            UnknownStatePolicy::KeepPolling => Predicate::any_failed(),
        }
    }

    /// Waits for `target`, failing on the default failure states.
    #[must_use]
    pub fn until(target: Predicate) -> Self {
        Self::new(target, Self::failure_for(UnknownStatePolicy::default()))
    }

    /// Waits for `NORMAL`.
    #[must_use]
    pub fn normal() -> Self {
        Self::until(Predicate::state_is(ProviderState::Normal))
    }

    /// Waits for `DELETED`.
    #[must_use]
    pub fn deleted() -> Self {
        Self::until(Predicate::state_is(ProviderState::Deleted))
    }

    /// Waits until the server's `started` and `deployed` flags match.
    #[must_use]
    pub fn server_power(started: bool, deployed: bool) -> Self {
        Self::until(
            Predicate::flag_is("started", started).and(Predicate::flag_is("deployed", deployed)),
        )
    }

    /// Replaces the failure predicate with the default for `policy`.
    #[must_use]
    pub fn with_unknown_policy(mut self, policy: UnknownStatePolicy) -> Self {
        self.failure = Self::failure_for(policy);
        self
    }

    /// Replaces the failure predicate.
    #[must_use]
    pub fn with_failure(mut self, failure: Predicate) -> Self {
        self.failure = failure;
        self
    }

    /// Predicate that signals convergence.
    #[must_use]
    pub const fn target(&self) -> &Predicate {
        &self.target
    }

    /// Predicate that signals a permanent failure.
    #[must_use]
    pub const fn failure(&self) -> &Predicate {
        &self.failure
    }
}
