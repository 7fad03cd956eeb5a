//! Cursor store
//!
//! In-memory cache of fetched pages, keyed by page number. The backend only
//! chains forward (page N needs the cursor emitted by page N-1), so the
//! store also answers "which cursor fetches page N".

use crate::error::{Error, Result};
use crate::fetch::PageFetchResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One cached page
///
/// Entries are never edited in place; a refetch replaces the whole entry.
#[derive(Debug)]
pub struct PageEntry<T> {
    /// One-based page number
    pub page: u32,
    /// Records on the page, in server order
    pub items: Arc<[T]>,
    /// Whether the server reported a following page
    pub has_more: bool,
    /// Cursor that fetches the following page
    pub next_cursor: Option<String>,
}

impl<T> PageEntry<T> {
    /// Create an entry
    pub fn new(page: u32, items: Vec<T>, has_more: bool, next_cursor: Option<String>) -> Self {
        Self {
            page,
            items: items.into(),
            has_more,
            next_cursor,
        }
    }

    /// Create an entry from a fetch result
    pub fn from_result(page: u32, result: PageFetchResult<T>) -> Self {
        Self::new(page, result.items, result.has_more, result.next_cursor)
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// Manual impl: items are shared, so `T` need not be `Clone`.
impl<T> Clone for PageEntry<T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page,
            items: Arc::clone(&self.items),
            has_more: self.has_more,
            next_cursor: self.next_cursor.clone(),
        }
    }
}

/// Page cache for one list view
///
/// Every [`clear`](Self::clear) starts a new cache generation.
#[derive(Debug)]
pub struct CursorStore<T> {
    pages: HashMap<u32, PageEntry<T>>,
    generation: u64,
}

impl<T> Default for CursorStore<T> {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            generation: 0,
        }
    }
}

impl<T> CursorStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a page
    pub fn get(&self, page: u32) -> Option<&PageEntry<T>> {
        self.pages.get(&page)
    }

    /// Check if a page is cached
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Store a page, replacing any previous entry for the same number
    pub fn put(&mut self, entry: PageEntry<T>) {
        debug!(
            page = entry.page,
            items = entry.len(),
            has_more = entry.has_more,
            generation = self.generation,
            "Caching page"
        );
        self.pages.insert(entry.page, entry);
    }

    /// Drop every page after `page`, returning how many went
    ///
    /// The generation is kept: pages up to `page` are still valid.
    pub fn truncate_after(&mut self, page: u32) -> usize {
        let before = self.pages.len();
        self.pages.retain(|&cached, _| cached <= page);
        before - self.pages.len()
    }

    /// Drop every cached page and start a new generation
    pub fn clear(&mut self) {
        self.pages.clear();
        self.generation += 1;
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Current cache generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cursor that fetches `page`
    ///
    /// Page 1 needs no cursor. Any later page needs its predecessor cached;
    /// otherwise the result is [`Error::UnresolvableCursor`]. A cached
    /// predecessor without a cursor yields `Ok(None)` (page-number backends).
    pub fn resolve_cursor_for(&self, page: u32) -> Result<Option<String>> {
        match page {
            0 => Err(Error::InvalidPage { page }),
            1 => Ok(None),
            _ => self
                .pages
                .get(&(page - 1))
                .map(|prev| prev.next_cursor.clone())
                .ok_or(Error::UnresolvableCursor { page }),
        }
    }

    /// Highest `k` such that pages `1..=k` are all cached; 0 when page 1 is not
    pub fn highest_contiguous(&self) -> u32 {
        let mut page = 0;
        while self.pages.contains_key(&(page + 1)) {
            page += 1;
        }
        page
    }

    /// Last page of the list, once the chain has reached it
    ///
    /// Known only when some page in the contiguous run reported
    /// `has_more = false`.
    pub fn last_page(&self) -> Option<u32> {
        (1..=self.highest_contiguous()).find(|page| {
            self.pages
                .get(page)
                .is_some_and(|entry| !entry.has_more)
        })
    }
}
