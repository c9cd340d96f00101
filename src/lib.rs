//! Core library for traversing and waiting on cloud-management APIs.
//!
//! Provider SDKs repeat two mechanisms for every resource type: walking a
//! paged "list" endpoint, and waiting for an asynchronously provisioned
//! resource to reach a target state. This crate implements both once:
//!
//! - [`pagination`] turns a "fetch one page" function into a lazy stream of
//!   items.
//! - [`poll`] turns a "fetch current state" function into a single converged,
//!   failed, or timed-out outcome.
//!
//! Provider code supplies the fetch functions, optionally through the
//! [`http::RestCollection`] adapter.

pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod poll;
pub mod state;
pub mod test_support;

pub use config::{ConfigError, ReelConfig};
pub use error::FetchError;
pub use http::RestCollection;
pub use pagination::{
    Marker, Page, PageRequest, PaginationError, PaginationOptions, PaginationOptionsBuilder,
    Paginator, paginate,
};
pub use poll::{
    Convergence, ConvergenceError, Deadline, PollError, PollOutcome, PollSettings, Predicate,
    UnknownStatePolicy, Waiter, poll_until,
};
pub use state::{NodeStatus, Phase, ProviderState, StateSnapshot};
pub use tokio_util::sync::CancellationToken;
