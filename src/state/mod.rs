//! Resource state values observed while polling.
//!
//! Providers report lifecycle state as free-form strings such as `NORMAL`,
//! `PENDING_ADD`, or `FAILED_DELETE`. [`ProviderState`] parses those strings
//! once so predicates can match on variants, while [`StateSnapshot`] keeps the
//! remaining raw provider fields for compound checks.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::FetchError;

/// Field holding the lifecycle state in provider payloads.
pub const STATE_FIELD: &str = "state";

/// Lifecycle state reported by the provider.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ProviderState {
    /// The resource is provisioned and idle.
    Normal,
    /// Creation has been accepted and is in progress.
    PendingAdd,
    /// A modification is in progress.
    PendingChange,
    /// Deletion is in progress.
    PendingDelete,
    /// Creation failed permanently.
    FailedAdd,
    /// A modification failed permanently.
    FailedChange,
    /// Deletion failed permanently.
    FailedDelete,
    /// The resource has been removed.
    Deleted,
    /// The provider gave up and the resource needs operator attention.
    RequiresSupport,
    /// A value this crate does not recognise, kept verbatim.
    Unrecognized(String),
}

/// Coarse classification of a [`ProviderState`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Phase {
    /// Expected to change without further caller action.
    Pending,
    /// Terminal and healthy, including removal.
    Succeeded,
    /// Terminal and broken.
    Failed,
    /// Not recognised; no transition can be predicted.
    Unknown,
}

/// Compute-node status derived from a [`ProviderState`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Provisioned and usable.
    Running,
    /// Transitioning.
    Pending,
    /// A provisioning step failed.
    Error,
    /// Removed.
    Terminated,
    /// The provider state could not be mapped.
    Unrecognized,
}

impl ProviderState {
    /// Parses a provider string. Accepts `UPPER_SNAKE` and `UpperCamel`
    /// spellings; anything else becomes [`ProviderState::Unrecognized`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match normalise(raw).as_str() {
            "NORMAL" => Self::Normal,
            "PENDINGADD" => Self::PendingAdd,
            "PENDINGCHANGE" => Self::PendingChange,
            "PENDINGDELETE" => Self::PendingDelete,
            "FAILEDADD" => Self::FailedAdd,
            "FAILEDCHANGE" => Self::FailedChange,
            "FAILEDDELETE" => Self::FailedDelete,
            "DELETED" => Self::Deleted,
            "REQUIRESSUPPORT" => Self::RequiresSupport,
            _ => Self::Unrecognized(raw.to_owned()),
        }
    }

    /// Canonical provider spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "NORMAL",
            Self::PendingAdd => "PENDING_ADD",
            Self::PendingChange => "PENDING_CHANGE",
            Self::PendingDelete => "PENDING_DELETE",
            Self::FailedAdd => "FAILED_ADD",
            Self::FailedChange => "FAILED_CHANGE",
            Self::FailedDelete => "FAILED_DELETE",
            Self::Deleted => "DELETED",
            Self::RequiresSupport => "REQUIRES_SUPPORT",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Returns `true` for any `FAILED_*` state, including variants this crate
    /// does not model, and for `REQUIRES_SUPPORT`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        match self {
            Self::FailedAdd | Self::FailedChange | Self::FailedDelete | Self::RequiresSupport => {
                true
            }
            Self::Unrecognized(raw) => normalise(raw).starts_with(FAILED_PREFIX),
            _ => false,
        }
    }

    /// Returns `true` when the provider string was not recognised.
    #[must_use]
    pub const fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }

    /// Classifies the state.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_failed() {
            return Phase::Failed;
        }
        match self {
            Self::Normal | Self::Deleted => Phase::Succeeded,
            Self::PendingAdd | Self::PendingChange | Self::PendingDelete => Phase::Pending,
            _ => Phase::Unknown,
        }
    }

    /// Maps the state onto a compute-node status.
    #[must_use]
    pub fn node_status(&self) -> NodeStatus {
        if self.is_failed() {
            return NodeStatus::Error;
        }
        match self {
            Self::Normal => NodeStatus::Running,
            Self::PendingAdd | Self::PendingChange | Self::PendingDelete => NodeStatus::Pending,
            Self::Deleted => NodeStatus::Terminated,
            _ => NodeStatus::Unrecognized,
        }
    }
}

const FAILED_PREFIX: &str = "FAILED";

/// Uppercases and strips separators so `FAILED_ADD` and `FailedAdd` compare
/// equal.
fn normalise(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| *ch != '_' && *ch != '-')
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}

impl FromStr for ProviderState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ProviderState {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProviderState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Point-in-time view of a resource, fetched fresh on every poll attempt.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StateSnapshot {
    /// Provider identifier of the resource.
    pub resource_id: String,
    /// Parsed lifecycle state.
    pub state: ProviderState,
    /// Remaining provider fields, such as `started` or `deployed`.
    pub attributes: BTreeMap<String, Value>,
}

impl StateSnapshot {
    /// Creates a snapshot with no extra attributes.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, state: impl Into<ProviderState>) -> Self {
        Self {
            resource_id: resource_id.into(),
            state: state.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds a raw provider attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Reads a boolean attribute, returning `None` when it is absent or not a
    /// boolean.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.attributes.get(name).and_then(Value::as_bool)
    }

    /// Reads a string attribute.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Provider detail explaining a failure, currently the raw state text.
    #[must_use]
    pub fn failure_detail(&self) -> String {
        self.state.as_str().to_owned()
    }

    /// Builds a snapshot from a provider JSON object. The `state` field is
    /// parsed and every other top-level field is kept as an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the body is not an object or has
    /// no string `state` field.
    pub fn from_json(resource_id: impl Into<String>, body: Value) -> Result<Self, FetchError> {
        let Value::Object(mut fields) = body else {
            return Err(FetchError::Decode {
                message: String::from("expected a JSON object"),
            });
        };
        let state = match fields.remove(STATE_FIELD) {
            Some(Value::String(raw)) => ProviderState::parse(&raw),
            _ => {
                return Err(FetchError::Decode {
                    message: format!("missing string field '{STATE_FIELD}'"),
                });
            }
        };

        Ok(Self {
            resource_id: resource_id.into(),
            state,
            attributes: fields.into_iter().collect(),
        })
    }
}
