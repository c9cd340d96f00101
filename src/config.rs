//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::pagination::{MAX_PAGE_SIZE, PaginationOptions};
use crate::poll::{PollSettings, UnknownStatePolicy, Waiter};

/// Paging and polling defaults derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "CLOUDREEL",
    discovery(
        app_name = "cloudreel",
        env_var = "CLOUDREEL_CONFIG_PATH",
        config_file_name = "cloudreel.toml",
        dotfile_name = ".cloudreel.toml",
        project_file_name = "cloudreel.toml"
    )
)]
pub struct ReelConfig {
    /// Seconds between state fetches while waiting. Provisioning is slow, so
    /// the default is one minute.
    #[ortho_config(default = 60)]
    pub poll_interval_secs: u64,
    /// Overall wait budget in seconds, measured from the first fetch.
    #[ortho_config(default = 1800)]
    pub wait_timeout_secs: u64,
    /// Page size sent with list calls. Unset or zero uses the provider
    /// default.
    pub default_page_size: Option<i64>,
    /// Field list calls are ordered by.
    pub default_order_by: Option<String>,
    /// Keep polling when the provider reports an unrecognised state instead
    /// of treating it as a failure.
    #[ortho_config(default = false)]
    pub keep_polling_on_unknown: bool,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn invalid(&self, problem: &str) -> ConfigError {
        ConfigError::Invalid(format!(
            "{} {problem}: set {} or {} in cloudreel.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const POLL_INTERVAL_FIELD: FieldMetadata = FieldMetadata::new(
    "poll interval",
    "CLOUDREEL_POLL_INTERVAL_SECS",
    "poll_interval_secs",
);
const WAIT_TIMEOUT_FIELD: FieldMetadata = FieldMetadata::new(
    "wait timeout",
    "CLOUDREEL_WAIT_TIMEOUT_SECS",
    "wait_timeout_secs",
);
const PAGE_SIZE_FIELD: FieldMetadata = FieldMetadata::new(
    "page size",
    "CLOUDREEL_DEFAULT_PAGE_SIZE",
    "default_page_size",
);

impl ReelConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("cloudreel")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and TOML key that set the offending value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a duration is zero or the page
    /// size is negative or above [`MAX_PAGE_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(POLL_INTERVAL_FIELD.invalid("must be greater than zero"));
        }
        if self.wait_timeout_secs == 0 {
            return Err(WAIT_TIMEOUT_FIELD.invalid("must be greater than zero"));
        }
        if let Some(size) = self.default_page_size
            && !(0..=i64::from(MAX_PAGE_SIZE)).contains(&size)
        {
            return Err(PAGE_SIZE_FIELD.invalid(&format!("{size} is outside 0..={MAX_PAGE_SIZE}")));
        }
        Ok(())
    }

    /// Builds poll settings from the configured interval and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn poll_settings(&self) -> Result<PollSettings, ConfigError> {
        self.validate()?;
        PollSettings::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.wait_timeout_secs),
        )
    }

    /// Builds first-page options from the configured page size and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn pagination_options(&self) -> Result<PaginationOptions, ConfigError> {
        self.validate()?;
        let page_size = self
            .default_page_size
            .map(|size| {
                u32::try_from(size).map_err(|_| ConfigError::PageSizeOutOfRange { requested: size })
            })
            .transpose()?;
        let builder = PaginationOptions::builder().maybe_page_size(page_size);
        match &self.default_order_by {
            Some(field) => builder.order_by(field.as_str()).build(),
            None => builder.build(),
        }
    }

    /// Policy applied to provider states this crate does not recognise.
    #[must_use]
    pub const fn unknown_state_policy(&self) -> UnknownStatePolicy {
        if self.keep_polling_on_unknown {
            UnknownStatePolicy::KeepPolling
        } else {
            UnknownStatePolicy::Fail
        }
    }

    /// Builds a [`Waiter`] carrying the configured settings and policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn waiter(&self) -> Result<Waiter, ConfigError> {
        Ok(Waiter::new(self.poll_settings()?).with_unknown_state_policy(self.unknown_state_policy()))
    }
}

/// Errors raised while validating configuration or paging options.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when a page number of zero is requested.
    #[error("page number must be at least 1")]
    InvalidPageNumber,
    /// Raised when the page size is negative or above the provider bound.
    #[error("page size {requested} is outside 0..={max}", max = MAX_PAGE_SIZE)]
    PageSizeOutOfRange {
        /// Page size that was requested.
        requested: i64,
    },
    /// Raised when a wait duration is zero.
    #[error("{field} must be greater than zero")]
    InvalidDuration {
        /// Name of the offending setting.
        field: String,
    },
    /// Raised when a configured value fails semantic validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
