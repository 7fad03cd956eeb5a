//! Pagination types
//!
//! State, outcomes and policies shared by the controller and its observers.

use super::strip::PagerView;
use crate::types::BackoffType;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default page size of the dashboard lists
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// A fetch (or forward walk) is in flight
    Loading,
    /// The last navigation failed; see the last error
    Error,
}

/// Pagination state of a list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Page on display
    pub current_page: u32,
    /// Page size
    pub items_per_page: u32,
    /// Whether the displayed page has a successor
    pub has_more: bool,
    /// Highest page displayed in this cache generation
    pub max_page_reached: u32,
    /// Cursor emitted by the displayed page
    pub offset: Option<String>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl PaginationState {
    /// Create state for a fresh list
    pub fn new(items_per_page: u32) -> Self {
        Self {
            current_page: 1,
            items_per_page,
            has_more: false,
            max_page_reached: 1,
            offset: None,
        }
    }

    /// Whether a previous page exists
    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Whether a next page exists
    pub fn can_go_next(&self) -> bool {
        self.has_more
    }
}

/// Where a navigation got its page from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    /// Already on display; nothing happened
    Unchanged,
    /// Served from the cursor store
    Cache,
    /// Fetched over the network
    Network,
}

/// Result of a successful navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavOutcome {
    /// Page now on display
    pub page: u32,
    /// How it was obtained
    pub source: PageSource,
    /// Number of network fetches issued
    pub fetched: u32,
    /// The requested page lies past the end of the list
    pub clamped: bool,
}

impl NavOutcome {
    pub(crate) fn unchanged(page: u32, clamped: bool) -> Self {
        Self {
            page,
            source: PageSource::Unchanged,
            fetched: 0,
            clamped,
        }
    }

    pub(crate) fn cached(page: u32, clamped: bool) -> Self {
        Self {
            page,
            source: PageSource::Cache,
            fetched: 0,
            clamped,
        }
    }

    pub(crate) fn network(page: u32, fetched: u32, clamped: bool) -> Self {
        Self {
            page,
            source: PageSource::Network,
            fetched,
            clamped,
        }
    }
}

/// Retries of a single page fetch, applied to retryable errors only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay growth between attempts
    pub backoff: BackoffType,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Surface the first failure
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffType::Exponential,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Retry up to `max_retries` times with exponential backoff
    pub fn retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::none()
        }
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff = backoff;
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .delay(attempt, self.initial_delay, self.max_delay)
    }
}

/// What a list view renders
#[derive(Debug)]
pub struct ListSnapshot<T> {
    /// Controller lifecycle
    pub status: ControllerStatus,
    /// Pagination state
    pub state: PaginationState,
    /// Records of the current page
    pub items: Arc<[T]>,
    /// Message of the last failed navigation, cleared on success
    pub error: Option<String>,
    /// Cache generation the items belong to
    pub generation: u64,
}

impl<T> ListSnapshot<T> {
    /// Page-button strip and navigation affordances
    pub fn view(&self) -> PagerView {
        PagerView::new(&self.state, self.items.len())
    }

    /// Check if a fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.status == ControllerStatus::Loading
    }
}

impl<T> Clone for ListSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            state: self.state.clone(),
            items: Arc::clone(&self.items),
            error: self.error.clone(),
            generation: self.generation,
        }
    }
}
