//! Page fetch types and traits

use crate::error::{Error, Result};
use crate::resource::FilterContext;
use crate::types::Record;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Everything needed to request one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Search and filter parameters
    pub filter: FilterContext,
    /// Cursor emitted by the previous page; `None` for page 1
    pub cursor: Option<String>,
}

impl PageRequest {
    /// Create a request for the first page
    pub fn first(limit: u32, filter: FilterContext) -> Self {
        Self {
            page: 1,
            limit,
            filter,
            cursor: None,
        }
    }

    /// Create a request for a later page
    pub fn after(page: u32, limit: u32, filter: FilterContext, cursor: Option<String>) -> Self {
        Self {
            page,
            limit,
            filter,
            cursor,
        }
    }
}

/// A normalized page of records
#[derive(Debug, Clone, PartialEq)]
pub struct PageFetchResult<T = Record> {
    /// Records on this page, in server order
    pub items: Vec<T>,
    /// Whether the server reports a following page
    pub has_more: bool,
    /// Opaque cursor for the following page
    pub next_cursor: Option<String>,
    /// Total record count, when the server reports one
    pub total_count: Option<u64>,
    /// Page number the server says it returned
    pub reported_page: Option<u32>,
}

impl<T> PageFetchResult<T> {
    /// Create a result from items and a has-more flag
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self {
            items,
            has_more,
            next_cursor: None,
            total_count: None,
            reported_page: None,
        }
    }

    /// Set the next cursor
    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PageFetchResult<Record> {
    /// Decode every item into a typed record
    ///
    /// A single undecodable row makes the whole page malformed.
    pub fn decode_items<T: DeserializeOwned>(self) -> Result<PageFetchResult<T>> {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|e| Error::malformed(format!("item {index} could not be decoded: {e}")))
            })
            .collect::<Result<Vec<T>>>()?;

        Ok(PageFetchResult {
            items,
            has_more: self.has_more,
            next_cursor: self.next_cursor,
            total_count: self.total_count,
            reported_page: self.reported_page,
        })
    }
}

/// Source of pages for the pagination controller
///
/// Implementations issue at most one network request per call and never
/// cache or retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Record type on each page
    type Item: Clone + Send + Sync + 'static;

    /// Fetch one page
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageFetchResult<Self::Item>>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    type Item = F::Item;

    async fn fetch_page(&self, request: &PageRequest) -> Result<PageFetchResult<Self::Item>> {
        (**self).fetch_page(request).await
    }
}
