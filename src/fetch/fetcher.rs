//! HTTP page fetcher
//!
//! Issues `GET {path}?page={n}&limit={l}&{filters}[&{cursor_param}={cursor}]`
//! and normalizes the response.

use super::normalize::normalize_page;
use super::types::{PageFetchResult, PageFetcher, PageRequest};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::resource::ResourceSpec;
use crate::types::Record;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Default query parameter carrying the cursor of the previous page
pub const DEFAULT_CURSOR_PARAM: &str = "offset";

/// Fetches pages of one resource over HTTP
///
/// `T` is the record type items are decoded into; the default keeps the raw
/// JSON rows.
pub struct HttpPageFetcher<T = Record> {
    client: HttpClient,
    resource: ResourceSpec,
    cursor_param: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpPageFetcher<T> {
    /// Create a fetcher for a resource
    pub fn new(client: HttpClient, resource: impl Into<ResourceSpec>) -> Self {
        Self {
            client,
            resource: resource.into(),
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
            _record: PhantomData,
        }
    }

    /// Override the cursor query parameter name
    #[must_use]
    pub fn with_cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }

    /// The resource this fetcher lists
    pub fn resource(&self) -> &ResourceSpec {
        &self.resource
    }

    /// Build the request configuration for a page
    pub fn request_config(&self, request: &PageRequest) -> RequestConfig {
        let mut config = RequestConfig::new()
            .query("page", request.page.to_string())
            .query("limit", request.limit.to_string())
            .authenticated(self.resource.requires_auth);

        for (key, value) in request.filter.to_query() {
            config = config.query(key, value);
        }

        if let Some(cursor) = &request.cursor {
            config = config.query(self.cursor_param.as_str(), cursor.as_str());
        }

        config
    }

    /// Fetch and normalize a page without decoding its items
    async fn fetch_raw(&self, request: &PageRequest) -> Result<PageFetchResult<Record>> {
        if request.page == 0 {
            return Err(Error::InvalidPage { page: 0 });
        }

        debug!(
            resource = %self.resource.kind,
            page = request.page,
            limit = request.limit,
            has_cursor = request.cursor.is_some(),
            filtered = !request.filter.is_empty(),
            "Fetching page"
        );

        let body: Value = self
            .client
            .get_json_with_config(&self.resource.path, self.request_config(request))
            .await?;

        let result = normalize_page(body, request.limit)?;

        if let Some(reported) = result.reported_page {
            if reported != request.page {
                warn!(
                    resource = %self.resource.kind,
                    requested = request.page,
                    reported,
                    "Server reported a different page than requested"
                );
            }
        }

        debug!(
            resource = %self.resource.kind,
            page = request.page,
            items = result.items.len(),
            has_more = result.has_more,
            "Fetched page"
        );

        Ok(result)
    }
}

impl<T> std::fmt::Debug for HttpPageFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageFetcher")
            .field("resource", &self.resource)
            .field("cursor_param", &self.cursor_param)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> PageFetcher for HttpPageFetcher<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, request: &PageRequest) -> Result<PageFetchResult<T>> {
        self.fetch_raw(request).await?.decode_items()
    }
}
