//! HTTP client module
//!
//! Provides the HTTP client used by the page fetcher and record client.
//!
//! # Features
//!
//! - **Single attempt per call**: retry policy lives in the pagination controller
//! - **Error classification**: network, timeout and API failures are kept apart
//! - **Authentication**: Integration with auth module

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
