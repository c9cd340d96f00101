//! Response-side pagination values.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;

use super::options::{Marker, PaginationOptions};

/// One batch of list results plus the metadata needed to request the next.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page<T> {
    /// Items in provider order.
    pub items: Vec<T>,
    /// One-based page number reported by the provider. Informational only;
    /// continuation follows the requested page number.
    pub page_number: u32,
    /// Page size reported by the provider; zero when it did not report one.
    pub page_size: u32,
    /// Total number of items across all pages, when known.
    pub total_count: Option<u64>,
    /// Continuation token for marker-based providers.
    pub next_marker: Option<Marker>,
}

impl<T> Page<T> {
    /// Creates a page with no total count and no marker.
    #[must_use]
    pub const fn new(items: Vec<T>, page_number: u32, page_size: u32) -> Self {
        Self {
            items,
            page_number,
            page_size,
            total_count: None,
            next_marker: None,
        }
    }

    /// Attaches the provider's total item count.
    #[must_use]
    pub const fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    /// Attaches a continuation marker.
    #[must_use]
    pub fn with_next_marker(mut self, marker: impl Into<Marker>) -> Self {
        self.next_marker = Some(marker.into());
        self
    }

    /// Decides whether another fetch is needed after this page.
    ///
    /// `seen` counts the items received so far in this traversal, this page
    /// included. An empty page always ends the sequence and a marker always
    /// continues it. Otherwise a short page ends it, a known total count
    /// decides, and a full page without a total asks for one more page. When
    /// no page size is known at all, only the total count can keep the
    /// traversal going.
    #[must_use]
    pub fn has_more(&self, requested: &PaginationOptions, seen: u64) -> bool {
        if self.items.is_empty() {
            return false;
        }
        if self.next_marker.is_some() {
            return true;
        }

        let effective_size = if self.page_size > 0 {
            Some(self.page_size)
        } else {
            requested.explicit_page_size()
        };
        let Some(page_size) = effective_size.map(u64::from) else {
            return self.total_count.is_some_and(|total| seen < total);
        };

        let received = u64::try_from(self.items.len()).unwrap_or(u64::MAX);
        if received < page_size {
            return false;
        }

        // The requested page number is authoritative; providers may omit or
        // misreport their own.
        match self.total_count {
            Some(total) => u64::from(requested.page_number()).saturating_mul(page_size) < total,
            None => true,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default = "first_page")]
    page_number: u32,
    #[serde(default)]
    page_size: u32,
    total_count: Option<u64>,
    next_marker: Option<String>,
}

const fn first_page() -> u32 {
    1
}

impl<T: DeserializeOwned> Page<T> {
    /// Decodes a paged collection envelope such as
    /// `{"node": [...], "pageNumber": 1, "pageCount": 2, "totalCount": 2, "pageSize": 250}`.
    ///
    /// A missing collection key decodes as an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the envelope metadata or any item
    /// does not match the expected shape.
    pub fn from_envelope(mut body: Value, collection_key: &str) -> Result<Self, FetchError> {
        let items = match body.get_mut(collection_key).map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(raw) => serde_json::from_value(raw)?,
        };
        let envelope: Envelope = serde_json::from_value(body)?;

        Ok(Self {
            items,
            page_number: envelope.page_number,
            page_size: envelope.page_size,
            total_count: envelope.total_count,
            next_marker: envelope.next_marker.map(Marker::from),
        })
    }
}
