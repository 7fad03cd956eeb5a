//! Tests for pagination module

use super::*;
use crate::error::{Error, Result};
use crate::fetch::{PageFetchResult, PageFetcher, PageRequest};
use crate::resource::FilterContext;
use crate::types::BackoffType;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

// ============================================================================
// Fake backend
// ============================================================================

/// In-memory list of `total` integers served in cursor-chained pages
///
/// Page N's cursor is `cN`; a request with the wrong cursor is rejected, so
/// any out-of-chain fetch shows up as a failure.
#[derive(Default)]
struct FakeBackend {
    total: AtomicU32,
    cursors: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<PageRequest>>,
    failures: Mutex<HashMap<u32, u32>>,
    malformed: Mutex<HashSet<u32>>,
}

impl FakeBackend {
    fn new(total: u32) -> Arc<Self> {
        Arc::new(Self {
            total: AtomicU32::new(total),
            cursors: true,
            ..Default::default()
        })
    }

    fn without_cursors(total: u32) -> Arc<Self> {
        Arc::new(Self {
            total: AtomicU32::new(total),
            cursors: false,
            ..Default::default()
        })
    }

    fn slow(total: u32, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            total: AtomicU32::new(total),
            cursors: true,
            delay: Some(delay),
            ..Default::default()
        })
    }

    /// Records added or removed server-side
    fn set_total(&self, total: u32) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn fail_page(&self, page: u32, times: u32) {
        self.failures.lock().unwrap().insert(page, times);
    }

    fn malformed_page(&self, page: u32) {
        self.malformed.lock().unwrap().insert(page);
    }

    fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().unwrap().iter().map(|r| r.page).collect()
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn fetch_count(&self, page: u32) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.page == page)
            .count()
    }
}

#[async_trait]
impl PageFetcher for FakeBackend {
    type Item = u32;

    async fn fetch_page(&self, request: &PageRequest) -> Result<PageFetchResult<u32>> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&request.page) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::api(503, "service unavailable"));
                }
            }
        }

        if self.malformed.lock().unwrap().contains(&request.page) {
            return Err(Error::malformed("no data field"));
        }

        let expected = (self.cursors && request.page > 1).then(|| format!("c{}", request.page - 1));
        if request.cursor != expected {
            return Err(Error::api(400, "cursor does not match page"));
        }

        let total = self.total.load(Ordering::SeqCst);
        let start = (request.page - 1) * request.limit;
        let end = (start + request.limit).min(total);
        let items: Vec<u32> = (start..end).collect();
        let has_more = end < total;

        let mut result = PageFetchResult::new(items, has_more);
        if has_more && self.cursors {
            result = result.with_cursor(format!("c{}", request.page));
        }
        Ok(result)
    }
}

fn controller(backend: &Arc<FakeBackend>) -> PaginationController<Arc<FakeBackend>> {
    PaginationController::new(Arc::clone(backend))
}

// ============================================================================
// CursorStore Tests
// ============================================================================

fn entry(page: u32, has_more: bool, cursor: Option<&str>) -> PageEntry<u32> {
    PageEntry::new(page, vec![page], has_more, cursor.map(String::from))
}

#[test]
fn test_store_get_put_overwrites() {
    let mut store = CursorStore::new();
    assert!(store.get(1).is_none());

    store.put(entry(1, true, Some("c1")));
    store.put(PageEntry::new(1, vec![7, 8], true, Some("c1b".to_string())));

    let cached = store.get(1).unwrap();
    assert_eq!(&*cached.items, &[7, 8]);
    assert_eq!(cached.next_cursor.as_deref(), Some("c1b"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_clear_bumps_generation() {
    let mut store = CursorStore::new();
    store.put(entry(1, true, Some("c1")));
    assert_eq!(store.generation(), 0);

    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.generation(), 1);
}

#[test]
fn test_store_resolve_cursor() {
    let mut store = CursorStore::new();

    assert_eq!(store.resolve_cursor_for(1).unwrap(), None);
    assert!(matches!(
        store.resolve_cursor_for(2),
        Err(Error::UnresolvableCursor { page: 2 })
    ));
    assert!(matches!(
        store.resolve_cursor_for(0),
        Err(Error::InvalidPage { page: 0 })
    ));

    store.put(entry(1, true, Some("c1")));
    assert_eq!(store.resolve_cursor_for(2).unwrap(), Some("c1".to_string()));
    assert!(matches!(
        store.resolve_cursor_for(5),
        Err(Error::UnresolvableCursor { page: 5 })
    ));
}

#[test]
fn test_store_resolve_without_cursor() {
    let mut store = CursorStore::new();
    store.put(entry(1, true, None));

    assert_eq!(store.resolve_cursor_for(2).unwrap(), None);
}

#[test]
fn test_store_highest_contiguous_and_last_page() {
    let mut store = CursorStore::new();
    assert_eq!(store.highest_contiguous(), 0);
    assert_eq!(store.last_page(), None);

    store.put(entry(1, true, Some("c1")));
    store.put(entry(2, true, Some("c2")));
    assert_eq!(store.highest_contiguous(), 2);
    assert_eq!(store.last_page(), None);

    store.put(entry(3, false, None));
    assert_eq!(store.highest_contiguous(), 3);
    assert_eq!(store.last_page(), Some(3));
}

// ============================================================================
// Page Strip Tests
// ============================================================================

fn strip_text(current: u32, max_reached: u32) -> String {
    page_strip(current, max_reached)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[test_case(1, 1, "1")]
#[test_case(1, 3, "1 2 3")]
#[test_case(4, 2, "1 2 3 4" ; "current beyond high water mark")]
#[test_case(2, 5, "1 2 3 4 5")]
#[test_case(1, 8, "1 2 3 ... 8")]
#[test_case(3, 8, "1 2 3 4 5 ... 8")]
#[test_case(4, 8, "1 2 3 4 5 6 ... 8")]
#[test_case(5, 9, "1 ... 3 4 5 6 7 ... 9")]
#[test_case(6, 8, "1 ... 4 5 6 7 8")]
#[test_case(8, 8, "1 ... 6 7 8")]
#[test_case(3, 6, "1 2 3 4 5 6")]
fn test_page_strip(current: u32, max_reached: u32, expected: &str) {
    assert_eq!(strip_text(current, max_reached), expected);
}

#[test]
fn test_pager_view() {
    let state = PaginationState {
        current_page: 3,
        items_per_page: 10,
        has_more: true,
        max_page_reached: 3,
        offset: Some("c3".to_string()),
    };

    let view = PagerView::new(&state, 10);

    assert_eq!(view.start_index, 21);
    assert_eq!(view.end_index, 30);
    assert!(view.can_go_prev);
    assert!(view.can_go_next);
    assert!(view.visible);
    assert_eq!(view.render(), "1 2 [3]");
}

#[test]
fn test_pager_view_hidden_for_empty_page() {
    let view = PagerView::new(&PaginationState::default(), 0);

    assert!(!view.visible);
    assert!(!view.can_go_prev);
    assert!(!view.can_go_next);
}

// ============================================================================
// Controller Tests
// ============================================================================

#[tokio::test]
async fn test_two_page_scenario() {
    let backend = FakeBackend::new(17);
    let mut pager = controller(&backend);

    let first = pager.go_to_page(1).await.unwrap();
    assert_eq!(first.source, PageSource::Network);
    assert_eq!(backend.requests()[0], PageRequest::first(10, FilterContext::new()));
    assert_eq!(pager.items().len(), 10);
    assert!(pager.state().has_more);
    assert_eq!(pager.state().offset.as_deref(), Some("c1"));

    pager.go_to_page(2).await.unwrap();
    assert_eq!(backend.requests()[1].cursor.as_deref(), Some("c1"));
    assert_eq!(pager.items().len(), 7);
    assert!(!pager.state().has_more);

    let back = pager.go_to_page(1).await.unwrap();
    assert_eq!(back.source, PageSource::Cache);

    let past_end = pager.go_to_page(3).await.unwrap();
    assert_eq!(past_end.page, 2);
    assert!(past_end.clamped);
    assert_eq!(past_end.fetched, 0);

    assert_eq!(pager.state().current_page, 2);
    assert_eq!(pager.state().max_page_reached, 2);
    assert_eq!(backend.requested_pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_at_most_one_fetch_per_page() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);

    for page in [3, 1, 5, 2, 5, 4, 1, 6, 3, 6, 2] {
        pager.go_to_page(page).await.unwrap();
        assert_eq!(pager.state().current_page, page);
    }

    for page in 1..=6 {
        assert_eq!(backend.fetch_count(page), 1, "page {page}");
    }
}

#[tokio::test]
async fn test_forward_walk_uses_each_predecessor_cursor() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let outcome = pager.go_to_page(5).await.unwrap();

    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.source, PageSource::Network);
    let requests = backend.requests();
    let walked: Vec<(u32, Option<String>)> = requests[1..]
        .iter()
        .map(|r| (r.page, r.cursor.clone()))
        .collect();
    assert_eq!(
        walked,
        vec![
            (2, Some("c1".to_string())),
            (3, Some("c2".to_string())),
            (4, Some("c3".to_string())),
            (5, Some("c4".to_string())),
        ]
    );
    assert_eq!(pager.state().max_page_reached, 5);
}

#[tokio::test]
async fn test_forward_walk_from_empty_cache() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);

    let outcome = pager.go_to_page(3).await.unwrap();

    assert_eq!(outcome.fetched, 3);
    assert_eq!(backend.requested_pages(), vec![1, 2, 3]);
    assert_eq!(pager.items(), &[20, 21, 22, 23, 24, 25, 26, 27, 28, 29]);
}

#[tokio::test]
async fn test_walk_clamps_at_end_of_list() {
    let backend = FakeBackend::new(25);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let outcome = pager.go_to_page(6).await.unwrap();

    assert_eq!(outcome.page, 3);
    assert!(outcome.clamped);
    assert_eq!(backend.requested_pages(), vec![1, 2, 3]);
    assert_eq!(pager.state().current_page, 3);
    assert_eq!(pager.items().len(), 5);
    assert!(!pager.state().has_more);
}

#[tokio::test]
async fn test_high_water_mark_is_monotonic() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);

    pager.go_to_page(4).await.unwrap();
    assert_eq!(pager.state().max_page_reached, 4);

    pager.go_to_page(2).await.unwrap();
    assert_eq!(pager.state().max_page_reached, 4);
    assert_eq!(pager.view().render(), "1 [2] 3 4");

    pager.invalidate();
    assert_eq!(pager.state().max_page_reached, 1);
    assert_eq!(pager.state().current_page, 2);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();
    let generation = pager.store().generation();

    pager.invalidate();
    assert!(pager.store().is_empty());
    assert_eq!(pager.store().generation(), generation + 1);
    assert_eq!(backend.fetch_count(1), 1);

    let outcome = pager.go_to_page(1).await.unwrap();
    assert_eq!(outcome.source, PageSource::Network);
    assert_eq!(backend.fetch_count(1), 2);
}

#[tokio::test]
async fn test_same_page_is_noop() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let outcome = pager.go_to_page(1).await.unwrap();

    assert_eq!(outcome.source, PageSource::Unchanged);
    assert_eq!(backend.fetch_count(1), 1);
}

#[tokio::test]
async fn test_reload_page_refetches_with_predecessor_cursor() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(2).await.unwrap();

    let outcome = pager.reload_page(2).await.unwrap();

    assert_eq!(outcome.fetched, 1);
    assert_eq!(backend.requested_pages(), vec![1, 2, 2]);
    assert_eq!(backend.requests()[2].cursor.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_reload_that_ends_list_drops_later_pages() {
    let backend = FakeBackend::new(40);
    let mut pager = controller(&backend);
    pager.go_to_page(4).await.unwrap();
    assert_eq!(pager.view().render(), "1 2 3 [4]");

    backend.set_total(20);
    pager.reload_page(2).await.unwrap();

    assert!(!pager.state().has_more);
    assert_eq!(pager.store().len(), 2);
    assert!(!pager.store().contains(3));
    assert_eq!(pager.store().last_page(), Some(2));
    assert_eq!(pager.state().max_page_reached, 2);
    assert_eq!(pager.view().render(), "1 [2]");

    let outcome = pager.go_to_page(4).await.unwrap();
    assert_eq!(outcome.page, 2);
    assert!(outcome.clamped);
    assert_eq!(backend.requested_pages(), vec![1, 2, 3, 4, 2]);
}

#[tokio::test]
async fn test_reload_with_unchanged_chain_keeps_later_pages() {
    let backend = FakeBackend::new(40);
    let mut pager = controller(&backend);
    pager.go_to_page(3).await.unwrap();

    pager.reload_page(2).await.unwrap();

    assert_eq!(pager.store().len(), 3);
    assert_eq!(pager.state().max_page_reached, 3);
    let outcome = pager.go_to_page(3).await.unwrap();
    assert_eq!(outcome.source, PageSource::Cache);
}

#[tokio::test]
async fn test_filter_change_clears_cache() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(2).await.unwrap();

    assert!(!pager.set_filter(FilterContext::new()));
    assert_eq!(pager.store().len(), 2);

    assert!(pager.set_filter(FilterContext::new().with_search("acme")));
    assert!(pager.store().is_empty());
    assert_eq!(pager.state().current_page, 1);
    assert!(pager.items().is_empty());

    pager.go_to_page(1).await.unwrap();
    assert_eq!(backend.fetch_count(1), 2);
    let last = backend.requests().pop().unwrap();
    assert_eq!(last.filter.search.as_deref(), Some("acme"));
}

#[tokio::test]
async fn test_apply_filter_loads_first_page() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let outcome = pager
        .apply_filter(FilterContext::new().with_role("ADMIN"))
        .await
        .unwrap();
    assert_eq!(outcome.source, PageSource::Network);

    let again = pager
        .apply_filter(FilterContext::new().with_role("ADMIN"))
        .await
        .unwrap();
    assert_eq!(again.source, PageSource::Unchanged);
    assert_eq!(backend.fetch_count(1), 2);
}

#[tokio::test]
async fn test_items_per_page_change_invalidates() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(2).await.unwrap();

    assert!(matches!(
        pager.set_items_per_page(0),
        Err(Error::InvalidConfigValue { .. })
    ));
    assert!(!pager.set_items_per_page(10).unwrap());
    assert!(pager.set_items_per_page(25).unwrap());
    assert!(pager.store().is_empty());

    pager.go_to_page(1).await.unwrap();
    assert_eq!(pager.items().len(), 25);
    assert_eq!(backend.requests().last().unwrap().limit, 25);
}

#[tokio::test]
async fn test_fetch_failure_keeps_current_page() {
    let backend = FakeBackend::new(30);
    backend.fail_page(2, 1);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let err = pager.go_to_page(2).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(pager.status(), ControllerStatus::Error);
    assert_eq!(pager.state().current_page, 1);
    assert!(pager.last_error().unwrap().contains("service unavailable"));
    assert!(!pager.store().contains(2));
}

#[tokio::test]
async fn test_failure_mid_walk_then_retry() {
    let backend = FakeBackend::new(100);
    backend.fail_page(3, 1);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    assert!(pager.go_to_page(4).await.is_err());
    assert_eq!(pager.status(), ControllerStatus::Error);
    assert_eq!(pager.state().current_page, 2);
    assert_eq!(pager.store().highest_contiguous(), 2);

    let outcome = pager.retry().await.unwrap();

    assert_eq!(outcome.page, 4);
    assert_eq!(pager.status(), ControllerStatus::Idle);
    assert!(pager.last_error().is_none());
    assert_eq!(backend.requested_pages(), vec![1, 2, 3, 3, 4]);
}

#[tokio::test]
async fn test_retry_without_failure_is_noop() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    let outcome = pager.retry().await.unwrap();

    assert_eq!(outcome.source, PageSource::Unchanged);
    assert_eq!(backend.requested_pages(), vec![1]);
}

#[tokio::test]
async fn test_retry_policy_retries_transient_errors() {
    let backend = FakeBackend::new(30);
    backend.fail_page(1, 2);
    let mut pager = controller(&backend).with_retry_policy(RetryPolicy::retries(2).with_backoff(
        BackoffType::Constant,
        Duration::from_millis(1),
        Duration::from_millis(1),
    ));

    pager.go_to_page(1).await.unwrap();

    assert_eq!(backend.fetch_count(1), 3);
    assert_eq!(pager.status(), ControllerStatus::Idle);
}

#[tokio::test]
async fn test_retry_policy_skips_malformed_responses() {
    let backend = FakeBackend::new(30);
    backend.malformed_page(1);
    let mut pager = controller(&backend).with_retry_policy(RetryPolicy::retries(3));

    let err = pager.go_to_page(1).await.unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert_eq!(backend.fetch_count(1), 1);
    assert!(pager.items().is_empty());
    assert_eq!(pager.status(), ControllerStatus::Error);
}

#[tokio::test]
async fn test_refresh_restarts_from_first_page() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);
    pager.go_to_page(3).await.unwrap();

    let outcome = pager.refresh().await.unwrap();

    assert_eq!(outcome.page, 1);
    assert_eq!(pager.state().current_page, 1);
    assert_eq!(pager.state().max_page_reached, 1);
    assert_eq!(pager.store().len(), 1);
    assert_eq!(backend.fetch_count(1), 2);
}

#[tokio::test]
async fn test_after_mutation_rewalks_to_current_page() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);
    pager.go_to_page(3).await.unwrap();

    let outcome = pager.after_mutation().await.unwrap();

    assert_eq!(outcome.page, 3);
    assert_eq!(outcome.fetched, 3);
    assert_eq!(backend.requested_pages(), vec![1, 2, 3, 1, 2, 3]);
}

#[tokio::test]
async fn test_next_and_prev_page() {
    let backend = FakeBackend::new(100);
    let mut pager = controller(&backend);
    pager.go_to_page(1).await.unwrap();

    pager.next_page().await.unwrap();
    pager.next_page().await.unwrap();
    assert_eq!(pager.state().current_page, 3);

    let back = pager.prev_page().await.unwrap();
    assert_eq!(back.source, PageSource::Cache);
    assert_eq!(pager.state().current_page, 2);
}

#[tokio::test]
async fn test_page_zero_is_rejected() {
    let backend = FakeBackend::new(30);
    let mut pager = controller(&backend);

    assert!(matches!(
        pager.go_to_page(0).await,
        Err(Error::InvalidPage { page: 0 })
    ));
    assert_eq!(pager.status(), ControllerStatus::Idle);
    assert!(backend.requested_pages().is_empty());
}

#[tokio::test]
async fn test_empty_list() {
    let backend = FakeBackend::new(0);
    let mut pager = controller(&backend);

    pager.go_to_page(1).await.unwrap();
    assert!(pager.items().is_empty());
    assert!(!pager.view().visible);

    let outcome = pager.go_to_page(2).await.unwrap();
    assert_eq!(outcome.page, 1);
    assert!(outcome.clamped);
    assert_eq!(backend.requested_pages(), vec![1]);
}

#[tokio::test]
async fn test_page_number_backend_without_cursors() {
    let backend = FakeBackend::without_cursors(50);
    let mut pager = controller(&backend);

    pager.go_to_page(3).await.unwrap();

    assert!(backend.requests().iter().all(|r| r.cursor.is_none()));
    assert_eq!(pager.items()[0], 20);
}

#[tokio::test]
async fn test_cancel_discards_in_flight_result() {
    let backend = FakeBackend::slow(30, Duration::from_millis(200));
    let mut pager = controller(&backend);
    let cancel = pager.cancel_handle();

    let (result, ()) = tokio::join!(pager.go_to_page(1), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(pager.store().is_empty());
    assert!(pager.items().is_empty());
    assert_eq!(pager.status(), ControllerStatus::Idle);
    assert!(matches!(pager.go_to_page(1).await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_subscribers_see_loading_then_idle() {
    let backend = FakeBackend::slow(30, Duration::from_millis(50));
    let mut pager = controller(&backend);
    let mut rx = pager.subscribe();

    let (result, saw_loading) = tokio::join!(pager.go_to_page(1), async {
        rx.changed().await.unwrap();
        rx.borrow_and_update().is_loading()
    });
    result.unwrap();

    assert!(saw_loading);
    let snapshot = rx.borrow().clone();
    assert_eq!(snapshot.status, ControllerStatus::Idle);
    assert_eq!(snapshot.items.len(), 10);
    assert_eq!(snapshot.view().render(), "[1]");
}

#[tokio::test]
async fn test_drop_cancels_handle() {
    let backend = FakeBackend::new(10);
    let pager = controller(&backend);
    let cancel = pager.cancel_handle();

    drop(pager);

    assert!(cancel.is_cancelled());
}
