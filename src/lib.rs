// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # admin-pager
//!
//! Paginated-list data controller for an admin dashboard.
//!
//! The dashboard API lists products, admin users and contact inquiries one
//! page at a time. It reports only whether a next page exists plus an opaque
//! forward cursor: there is no total count and no way to jump straight to
//! page N. This crate caches every fetched page, resolves the cursor chain
//! forward when a user jumps ahead, and tracks how far the list has been
//! explored so a numbered page strip can be drawn.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use admin_pager::config::DashboardConfig;
//! use admin_pager::pagination::PaginationController;
//! use admin_pager::resource::ResourceKind;
//!
//! #[tokio::main]
//! async fn main() -> admin_pager::Result<()> {
//!     let config = DashboardConfig::load(None)?;
//!     let fetcher = config.fetcher(config.http_client()?, ResourceKind::Products);
//!     let mut pager = PaginationController::new(fetcher);
//!
//!     pager.go_to_page(3).await?; // fetches pages 1, 2 and 3
//!     pager.go_to_page(1).await?; // served from cache
//!     println!("{}", pager.view().render());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    List view / CLI (browse)                     │
//! │        subscribe() → ListSnapshot      view() → PagerView       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     PaginationController                        │
//! │  go_to_page · next/prev · refresh · invalidate · after_mutation │
//! └─────────────────────────────────────────────────────────────────┘
//!                │                                │
//! ┌──────────────┴──────────────┐   ┌─────────────┴───────────────┐
//! │        CursorStore          │   │   PageFetcher (HTTP)        │
//! │  page → items, cursor       │   │  GET ?page&limit&offset     │
//! └─────────────────────────────┘   └─────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request authentication
pub mod auth;

/// HTTP client
pub mod http;

/// Resource kinds, filters and record types
pub mod resource;

/// Page fetching and record mutations
pub mod fetch;

/// Cursor store and pagination controller
pub mod pagination;

/// Layered configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use pagination::{CursorStore, PaginationController, PaginationState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
