//! Request-side pagination values: options, markers, and page requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Largest page size accepted by the provider.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Query parameter carrying the one-based page number.
pub const PAGE_NUMBER_PARAM: &str = "pageNumber";
/// Query parameter carrying the requested page size.
pub const PAGE_SIZE_PARAM: &str = "pageSize";
/// Query parameter carrying the sort field.
pub const ORDER_BY_PARAM: &str = "orderBy";

/// Paging parameters for a single list call.
///
/// A fresh value is produced for each list operation. The engine copies it
/// into every [`PageRequest`] and only ever advances the page number.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PaginationOptions {
    page_number: u32,
    page_size: Option<u32>,
    order_by: Option<String>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: None,
            order_by: None,
        }
    }
}

impl PaginationOptions {
    /// Starts a builder for [`PaginationOptions`].
    #[must_use]
    pub fn builder() -> PaginationOptionsBuilder {
        PaginationOptionsBuilder::new()
    }

    /// One-based page number of the first page to request.
    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Requested page size. `None` and `Some(0)` both defer to the provider
    /// default.
    #[must_use]
    pub const fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Field the provider should order results by.
    #[must_use]
    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    /// Requested page size when the caller asked for an explicit, non-zero
    /// size.
    #[must_use]
    pub fn explicit_page_size(&self) -> Option<u32> {
        self.page_size.filter(|size| *size > 0)
    }

    /// Returns a copy pointing at the following page.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
            ..self.clone()
        }
    }

    /// Renders the provider query parameters, skipping unset values.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(PAGE_NUMBER_PARAM, self.page_number.to_string())];
        if let Some(size) = self.page_size {
            pairs.push((PAGE_SIZE_PARAM, size.to_string()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push((ORDER_BY_PARAM, order_by.clone()));
        }
        pairs
    }
}

/// Builder for [`PaginationOptions`] that validates bounds on `build`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaginationOptionsBuilder {
    page_number: u32,
    page_size: Option<u32>,
    order_by: Option<String>,
}

impl Default for PaginationOptionsBuilder {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: None,
            order_by: None,
        }
    }
}

impl PaginationOptionsBuilder {
    /// Creates a builder that starts at page one with the provider's default
    /// page size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the one-based page number.
    #[must_use]
    pub const fn page_number(mut self, value: u32) -> Self {
        self.page_number = value;
        self
    }

    /// Sets the page size. Zero asks the provider to use its default.
    #[must_use]
    pub const fn page_size(mut self, value: u32) -> Self {
        self.page_size = Some(value);
        self
    }

    /// Sets or clears the page size.
    #[must_use]
    pub const fn maybe_page_size(mut self, value: Option<u32>) -> Self {
        self.page_size = value;
        self
    }

    /// Sets the ordering field; blank values clear it.
    #[must_use]
    pub fn order_by(mut self, value: impl Into<String>) -> Self {
        let field = value.into().trim().to_owned();
        self.order_by = (!field.is_empty()).then_some(field);
        self
    }

    /// Builds the options, rejecting values the provider would refuse.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPageNumber`] when the page number is zero
    /// and [`ConfigError::PageSizeOutOfRange`] when the page size exceeds
    /// [`MAX_PAGE_SIZE`].
    pub fn build(self) -> Result<PaginationOptions, ConfigError> {
        if self.page_number == 0 {
            return Err(ConfigError::InvalidPageNumber);
        }
        if let Some(size) = self.page_size
            && size > MAX_PAGE_SIZE
        {
            return Err(ConfigError::PageSizeOutOfRange {
                requested: i64::from(size),
            });
        }
        Ok(PaginationOptions {
            page_number: self.page_number,
            page_size: self.page_size,
            order_by: self.order_by,
        })
    }
}

/// Opaque continuation token returned by providers that page with markers.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(String);

impl Marker {
    /// Wraps a provider token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Marker {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Marker {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Argument handed to a page fetcher for each page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageRequest {
    /// Paging options with the page number of the page being requested.
    pub options: PaginationOptions,
    /// Continuation token from the previous page, when the provider issued
    /// one.
    pub marker: Option<Marker>,
}

impl PageRequest {
    /// Request for the first page described by `options`.
    #[must_use]
    pub const fn first(options: PaginationOptions) -> Self {
        Self {
            options,
            marker: None,
        }
    }

    /// Page number being requested.
    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.options.page_number()
    }
}
