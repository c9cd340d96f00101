//! Errors raised by provider fetch functions.
//!
//! Page and state fetchers are supplied by provider-specific code. They report
//! failures through [`FetchError`] so that both engines can tell a missing
//! collection apart from a transport or provider fault.

use thiserror::Error;

/// Failure reported by a page or state fetcher.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FetchError {
    /// Raised when the requested resource or collection does not exist.
    #[error("resource not found: {resource}")]
    NotFound {
        /// Provider path or identifier that was requested.
        resource: String,
    },
    /// Raised when the request could not be delivered or the response could
    /// not be read.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP layer.
        message: String,
    },
    /// Raised when the provider answers with a non-success status.
    #[error("provider returned status {status}: {message}")]
    Provider {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body or provider error detail.
        message: String,
    },
    /// Raised when a response body does not match the expected shape.
    #[error("failed to decode provider response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

impl FetchError {
    /// Returns `true` when the fetch failed because the resource is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            message: value.to_string(),
        }
    }
}
