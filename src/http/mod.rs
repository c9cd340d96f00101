//! `reqwest` adapter exposing a REST collection as page and state fetchers.
//!
//! Providers publish list endpoints such as `/networkDomainVip/node` that
//! accept `pageNumber`, `pageSize`, and `orderBy` query parameters and return
//! a paged envelope, plus item endpoints such as `/networkDomainVip/node/{id}`
//! that carry a `state` field. [`RestCollection`] wires both into the engines
//! and maps HTTP 404 onto [`FetchError::NotFound`].

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::pagination::{Page, PageRequest};
use crate::state::StateSnapshot;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter carrying a continuation marker.
pub const MARKER_PARAM: &str = "marker";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// A provider collection reachable over HTTP.
#[derive(Clone, Debug)]
pub struct RestCollection {
    client: reqwest::Client,
    base_url: String,
    collection_key: String,
    headers: HeaderMap,
}

impl RestCollection {
    /// Creates an adapter for the list endpoint at `base_url` whose envelope
    /// stores items under `collection_key`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, collection_key: impl Into<String>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            collection_key: collection_key.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Replaces the shared HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Adds a header sent with every request, for example an auth token.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the name or value is not a
    /// valid HTTP header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, FetchError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| FetchError::Transport {
                message: format!("invalid header name '{name}': {err}"),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| FetchError::Transport {
            message: format!("invalid value for header '{name}': {err}"),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// List endpoint URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters sent for `request`.
    #[must_use]
    pub fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = request.options.query_pairs();
        if let Some(marker) = &request.marker {
            query.push((MARKER_PARAM, marker.as_str().to_owned()));
        }
        query
    }

    /// Fetches one page of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] on HTTP 404, [`FetchError::Provider`]
    /// on any other non-success status, and [`FetchError::Transport`] or
    /// [`FetchError::Decode`] when the exchange or body is unusable.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: PageRequest,
    ) -> Result<Page<T>, FetchError> {
        debug!(url = %self.base_url, page_number = request.page_number(), "GET page");
        let response = self
            .client
            .get(&self.base_url)
            .headers(self.headers.clone())
            .query(&Self::page_query(&request))
            .send()
            .await?;
        let body = Self::read_json(response, &self.base_url).await?;
        Page::from_envelope(body, &self.collection_key)
    }

    /// Fetches the current state of one item.
    ///
    /// # Errors
    ///
    /// Same classification as [`RestCollection::fetch_page`]; additionally
    /// [`FetchError::Decode`] when the body has no `state` field.
    pub async fn fetch_state(&self, resource_id: String) -> Result<StateSnapshot, FetchError> {
        let url = self.item_url(&resource_id)?;
        debug!(%url, "GET state");
        let response = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .send()
            .await?;
        let body = Self::read_json(response, url.as_str()).await?;
        StateSnapshot::from_json(resource_id, body)
    }

    /// Item endpoint for `resource_id`, percent-encoded as one path segment.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the collection URL cannot be
    /// parsed or cannot carry a path.
    pub fn item_url(&self, resource_id: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| FetchError::Transport {
            message: format!("invalid collection URL '{}': {err}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport {
                message: format!("collection URL '{}' cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .push(resource_id);
        Ok(url)
    }

    async fn read_json(response: reqwest::Response, url: &str) -> Result<Value, FetchError> {
        let status = response.status();
        let body = response.bytes().await?;
        classify(status, &body, url)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn classify(status: StatusCode, body: &[u8], url: &str) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            resource: url.to_owned(),
        });
    }
    Err(FetchError::Provider {
        status: status.as_u16(),
        message: String::from_utf8_lossy(body).into_owned(),
    })
}
