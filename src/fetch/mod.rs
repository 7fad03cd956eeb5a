//! Page fetch module
//!
//! Turns "page P of resource R with filters F after cursor C" into one HTTP
//! request and normalizes whatever list envelope comes back into a
//! [`PageFetchResult`].
//!
//! # Overview
//!
//! - [`PageFetcher`] is the seam the pagination controller drives. It never
//!   caches and never retries.
//! - [`HttpPageFetcher`] implements it against the dashboard API.
//! - [`normalize_page`] accepts both the `{success, data, pagination}`
//!   envelope and bare arrays, and refuses anything without an items list.
//! - [`RecordClient`] performs the create/update/delete calls whose success
//!   invalidates a list.

mod fetcher;
mod mutations;
mod normalize;
mod types;

pub use fetcher::{HttpPageFetcher, DEFAULT_CURSOR_PARAM};
pub use mutations::{MutationOutcome, RecordClient};
pub use normalize::normalize_page;
pub use types::{PageFetchResult, PageFetcher, PageRequest};
