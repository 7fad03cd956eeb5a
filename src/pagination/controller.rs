//! Pagination controller
//!
//! Decides, for every navigation, whether the cursor store can answer or a
//! fetch is needed, walks the cursor chain forward when the requested page's
//! predecessor was never fetched, and publishes what the list view renders.
//!
//! Navigation methods take `&mut self`, so a controller never has two
//! fetches in flight and the cursor store never sees interleaved writes.

use super::store::{CursorStore, PageEntry};
use super::strip::PagerView;
use super::types::{
    ControllerStatus, ListSnapshot, NavOutcome, PaginationState, RetryPolicy,
    DEFAULT_ITEMS_PER_PAGE,
};
use crate::error::{Error, Result};
use crate::fetch::{PageFetchResult, PageFetcher, PageRequest};
use crate::resource::FilterContext;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Tears a controller down from outside
///
/// Once cancelled, an in-flight fetch resolves to [`Error::Cancelled`], its
/// result is dropped without touching the cursor store, and every later
/// navigation fails the same way.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel the controller
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check if the controller was cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Paginated list controller
///
/// Generic over the page source, so one state machine serves every resource.
pub struct PaginationController<F: PageFetcher> {
    fetcher: F,
    store: CursorStore<F::Item>,
    state: PaginationState,
    filter: FilterContext,
    status: ControllerStatus,
    items: Arc<[F::Item]>,
    /// Displayed items belong to the current cache generation
    loaded: bool,
    last_error: Option<String>,
    /// Last failed navigation, re-issued by `retry()`
    failed: Option<(u32, bool)>,
    retry: RetryPolicy,
    cancel: CancelHandle,
    updates: watch::Sender<ListSnapshot<F::Item>>,
}

impl<F: PageFetcher> PaginationController<F> {
    /// Create a controller with the default page size and no filters
    pub fn new(fetcher: F) -> Self {
        Self::with_options(fetcher, DEFAULT_ITEMS_PER_PAGE, FilterContext::default())
    }

    /// Create a controller with a page size and filter context
    ///
    /// A zero page size falls back to the default.
    pub fn with_options(fetcher: F, items_per_page: u32, filter: FilterContext) -> Self {
        let items_per_page = if items_per_page == 0 {
            DEFAULT_ITEMS_PER_PAGE
        } else {
            items_per_page
        };
        let state = PaginationState::new(items_per_page);
        let items: Arc<[F::Item]> = Arc::from(Vec::new());
        let (updates, _rx) = watch::channel(ListSnapshot {
            status: ControllerStatus::Idle,
            state: state.clone(),
            items: Arc::clone(&items),
            error: None,
            generation: 0,
        });

        Self {
            fetcher,
            store: CursorStore::new(),
            state,
            filter,
            status: ControllerStatus::Idle,
            items,
            loaded: false,
            last_error: None,
            failed: None,
            retry: RetryPolicy::none(),
            cancel: CancelHandle::new(),
            updates,
        }
    }

    /// Set the retry policy for page fetches
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Pagination state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Lifecycle status
    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    /// Records of the displayed page
    pub fn items(&self) -> &[F::Item] {
        &self.items
    }

    /// Active filter context
    pub fn filter(&self) -> &FilterContext {
        &self.filter
    }

    /// Message of the last failed navigation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Read-only view of the page cache
    pub fn store(&self) -> &CursorStore<F::Item> {
        &self.store
    }

    /// Handle that tears this controller down
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Subscribe to snapshots, published on every state change
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<F::Item>> {
        self.updates.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ListSnapshot<F::Item> {
        ListSnapshot {
            status: self.status,
            state: self.state.clone(),
            items: Arc::clone(&self.items),
            error: self.last_error.clone(),
            generation: self.store.generation(),
        }
    }

    /// Page-button strip and navigation affordances
    pub fn view(&self) -> PagerView {
        PagerView::new(&self.state, self.items.len())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Show page `page`, from cache when possible
    pub async fn go_to_page(&mut self, page: u32) -> Result<NavOutcome> {
        self.navigate(page, false).await
    }

    /// Show page `page`, always refetching it
    pub async fn reload_page(&mut self, page: u32) -> Result<NavOutcome> {
        self.navigate(page, true).await
    }

    /// Show the following page
    pub async fn next_page(&mut self) -> Result<NavOutcome> {
        self.go_to_page(self.state.current_page + 1).await
    }

    /// Show the preceding page
    pub async fn prev_page(&mut self) -> Result<NavOutcome> {
        self.go_to_page(self.state.current_page.saturating_sub(1).max(1))
            .await
    }

    /// Drop the cache and reload page 1
    pub async fn refresh(&mut self) -> Result<NavOutcome> {
        self.invalidate();
        self.navigate(1, true).await
    }

    /// Re-issue the last failed navigation
    ///
    /// Without a failed navigation this is a no-op on the current page.
    pub async fn retry(&mut self) -> Result<NavOutcome> {
        match self.failed.take() {
            Some((page, forced)) => self.navigate(page, forced).await,
            None => Ok(NavOutcome::unchanged(self.state.current_page, false)),
        }
    }

    /// Reload after a record was created, updated or deleted
    ///
    /// Any mutation can shift every later page, so the whole cache goes and
    /// the current page is reached again through the cursor chain.
    pub async fn after_mutation(&mut self) -> Result<NavOutcome> {
        self.invalidate();
        self.navigate(self.state.current_page, true).await
    }

    /// Drop every cached page
    ///
    /// Resets the high-water mark to 1. Neither changes the current page nor
    /// fetches anything.
    pub fn invalidate(&mut self) {
        self.store.clear();
        self.state.max_page_reached = 1;
        self.loaded = false;
        self.failed = None;
        info!(
            generation = self.store.generation(),
            current_page = self.state.current_page,
            "Page cache invalidated"
        );
        self.publish();
    }

    /// Replace the filter context
    ///
    /// Cursors from one context mean nothing in another, so a change drops
    /// the cache and moves back to page 1. Returns whether anything changed.
    pub fn set_filter(&mut self, filter: FilterContext) -> bool {
        if filter == self.filter {
            return false;
        }
        debug!(?filter, "Filter context changed");
        self.filter = filter;
        self.reset_position();
        true
    }

    /// Replace the filter context and load page 1 if it changed
    pub async fn apply_filter(&mut self, filter: FilterContext) -> Result<NavOutcome> {
        if self.set_filter(filter) {
            self.navigate(1, true).await
        } else {
            Ok(NavOutcome::unchanged(self.state.current_page, false))
        }
    }

    /// Change the page size
    ///
    /// Cursors are sized at issuance, so this behaves like a filter change.
    pub fn set_items_per_page(&mut self, items_per_page: u32) -> Result<bool> {
        if items_per_page == 0 {
            return Err(Error::invalid_value(
                "items_per_page",
                "must be greater than zero",
            ));
        }
        if items_per_page == self.state.items_per_page {
            return Ok(false);
        }
        self.state.items_per_page = items_per_page;
        self.reset_position();
        Ok(true)
    }

    fn reset_position(&mut self) {
        self.state.current_page = 1;
        self.state.has_more = false;
        self.state.offset = None;
        self.items = Arc::from(Vec::new());
        self.invalidate();
    }

    async fn navigate(&mut self, page: u32, forced: bool) -> Result<NavOutcome> {
        if page == 0 {
            return Err(Error::InvalidPage { page });
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // The chain already ended before `page`: settle on the last page.
        let (target, clamped) = match self.store.last_page() {
            Some(last) if page > last => (last, true),
            _ => (page, false),
        };
        if clamped {
            debug!(requested = page, last = target, "Clamping to last page");
        }

        if !forced {
            if target == self.state.current_page && self.loaded && self.store.contains(target) {
                self.settle();
                return Ok(NavOutcome::unchanged(target, clamped));
            }

            if let Some(entry) = self.store.get(target).cloned() {
                debug!(page = target, "Page cache hit");
                self.show(&entry);
                self.settle();
                return Ok(NavOutcome::cached(target, clamped));
            }
        }

        self.status = ControllerStatus::Loading;
        self.publish();

        match self.fetch_toward(target).await {
            Ok(outcome) => {
                let outcome = NavOutcome {
                    clamped: outcome.clamped || clamped,
                    ..outcome
                };
                info!(
                    page = outcome.page,
                    fetched = outcome.fetched,
                    clamped = outcome.clamped,
                    max_page_reached = self.state.max_page_reached,
                    "Navigation complete"
                );
                self.settle();
                Ok(outcome)
            }
            Err(Error::Cancelled) => {
                debug!(page = target, "Navigation cancelled");
                self.status = ControllerStatus::Idle;
                self.publish();
                Err(Error::Cancelled)
            }
            Err(err) => {
                warn!(
                    page = target,
                    current_page = self.state.current_page,
                    error = %err,
                    "Navigation failed"
                );
                self.status = ControllerStatus::Error;
                self.last_error = Some(err.to_string());
                self.failed = Some((target, forced));
                self.publish();
                Err(err)
            }
        }
    }

    /// Fetch `target`, walking forward from the cached chain when needed
    ///
    /// Every fetched page is stored and displayed before the next one is
    /// requested, so a failure mid-walk leaves the last good page showing.
    async fn fetch_toward(&mut self, target: u32) -> Result<NavOutcome> {
        let start = match self.store.resolve_cursor_for(target) {
            Ok(_) => target,
            Err(Error::UnresolvableCursor { .. }) => {
                let start = self.store.highest_contiguous() + 1;
                debug!(target, start, "Walking cursor chain forward");
                start
            }
            Err(e) => return Err(e),
        };

        let mut fetched = 0;
        for page in start..=target {
            let request = if page == 1 {
                PageRequest::first(self.state.items_per_page, self.filter.clone())
            } else {
                PageRequest::after(
                    page,
                    self.state.items_per_page,
                    self.filter.clone(),
                    self.store.resolve_cursor_for(page)?,
                )
            };

            let result = self.fetch_with_retry(&request).await?;
            fetched += 1;

            let entry = PageEntry::from_result(page, result);
            let has_more = entry.has_more;
            self.drop_stale_successors(&entry);
            self.store.put(entry.clone());
            self.show(&entry);
            self.publish();

            if !has_more && page < target {
                debug!(page, target, "List ended before target page");
                return Ok(NavOutcome::network(page, fetched, true));
            }
        }

        Ok(NavOutcome::network(target, fetched, false))
    }

    /// Forget pages after `entry` when its refetch moved the chain
    ///
    /// Later pages were reached through the old cursor, or past an end the
    /// list no longer has. The high-water mark falls back to `entry`.
    fn drop_stale_successors(&mut self, entry: &PageEntry<F::Item>) {
        let Some(previous) = self.store.get(entry.page) else {
            return;
        };
        if previous.has_more == entry.has_more && previous.next_cursor == entry.next_cursor {
            return;
        }

        let dropped = self.store.truncate_after(entry.page);
        self.state.max_page_reached = self.state.max_page_reached.min(entry.page);
        debug!(
            page = entry.page,
            dropped,
            has_more = entry.has_more,
            "Cursor chain changed on refetch"
        );
    }

    async fn fetch_with_retry(&self, request: &PageRequest) -> Result<PageFetchResult<F::Item>> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(request).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        page = request.page,
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_retries + 1,
                        error = %err,
                        "Page fetch failed, retrying in {:?}",
                        delay
                    );
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, request: &PageRequest) -> Result<PageFetchResult<F::Item>> {
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            result = self.fetcher.fetch_page(request) => result,
        };

        // A result that lands after teardown is discarded.
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        result
    }

    /// Display a page and advance the high-water mark
    fn show(&mut self, entry: &PageEntry<F::Item>) {
        self.state.current_page = entry.page;
        self.state.has_more = entry.has_more;
        self.state.offset = entry.next_cursor.clone();
        self.state.max_page_reached = self.state.max_page_reached.max(entry.page);
        self.items = Arc::clone(&entry.items);
        self.loaded = true;
    }

    fn settle(&mut self) {
        self.status = ControllerStatus::Idle;
        self.last_error = None;
        self.failed = None;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

impl<F: PageFetcher> Drop for PaginationController<F> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<F: PageFetcher + std::fmt::Debug> std::fmt::Debug for PaginationController<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationController")
            .field("fetcher", &self.fetcher)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("filter", &self.filter)
            .field("cached_pages", &self.store.len())
            .field("generation", &self.store.generation())
            .finish_non_exhaustive()
    }
}
