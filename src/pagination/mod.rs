//! Pagination module
//!
//! Cached, cursor-chained page navigation for list views.
//!
//! # Overview
//!
//! The backend exposes only `hasMore` and an opaque forward cursor: no total
//! count and no random access by page number. This module makes a numbered
//! page UI work on top of that:
//!
//! - [`CursorStore`] caches fetched pages and resolves the cursor that
//!   fetches page N from page N-1.
//! - [`PaginationController`] serves navigations from the store when it can,
//!   walks the cursor chain forward when it must, and tracks the highest page
//!   reached so the page strip can show pages whose existence was inferred.
//! - [`page_strip`] and [`PagerView`] turn controller state into the
//!   page-button strip.

mod controller;
mod store;
mod strip;
mod types;

pub use controller::{CancelHandle, PaginationController};
pub use store::{CursorStore, PageEntry};
pub use strip::{page_strip, PageButton, PagerView, MAX_VISIBLE_PAGES};
pub use types::{
    ControllerStatus, ListSnapshot, NavOutcome, PageSource, PaginationState, RetryPolicy,
    DEFAULT_ITEMS_PER_PAGE,
};

#[cfg(test)]
mod tests;
