//! Page-button strip
//!
//! The true last page is unknown until a page reports no successor, so the
//! strip spans `1..=max(max_page_reached, current_page)` and compacts long
//! runs around the current page with ellipses.

use super::types::PaginationState;
use serde::Serialize;

/// Strips up to this many pages are shown in full
pub const MAX_VISIBLE_PAGES: u32 = 5;

/// Pages shown on each side of the current page in a compacted strip
const WINDOW: u32 = 2;

/// One slot of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageButton {
    /// A clickable page number
    Page(u32),
    /// A gap of one or more hidden pages
    Ellipsis,
}

impl std::fmt::Display for PageButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Compute the strip for a position
///
/// ```text
/// current 1, reached 3  → 1 2 3
/// current 1, reached 8  → 1 2 3 ... 8
/// current 5, reached 9  → 1 ... 3 4 5 6 7 ... 9
/// ```
pub fn page_strip(current_page: u32, max_page_reached: u32) -> Vec<PageButton> {
    let current = current_page.max(1);
    let end = max_page_reached.max(current);

    if end <= MAX_VISIBLE_PAGES {
        return (1..=end).map(PageButton::Page).collect();
    }

    let window_start = current.saturating_sub(WINDOW).max(1);
    let window_end = end.min(current + WINDOW);
    let mut buttons = Vec::with_capacity(MAX_VISIBLE_PAGES as usize + 4);

    if window_start > 1 {
        buttons.push(PageButton::Page(1));
        if window_start > 2 {
            buttons.push(PageButton::Ellipsis);
        }
    }

    buttons.extend((window_start..=window_end).map(PageButton::Page));

    if window_end < end {
        if window_end < end - 1 {
            buttons.push(PageButton::Ellipsis);
        }
        buttons.push(PageButton::Page(end));
    }

    buttons
}

/// Navigation affordances of a list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerView {
    /// Page-button strip
    pub buttons: Vec<PageButton>,
    /// Page on display
    pub current_page: u32,
    /// Enable the "previous" control
    pub can_go_prev: bool,
    /// Enable the "next" control
    pub can_go_next: bool,
    /// One-based index of the first record on the page
    pub start_index: u64,
    /// One-based index of the last record on the page
    pub end_index: u64,
    /// Pagination is hidden for an empty page
    pub visible: bool,
}

impl PagerView {
    /// Derive the view from pagination state and the current page size
    pub fn new(state: &PaginationState, items_on_page: usize) -> Self {
        let start_index =
            u64::from(state.current_page.saturating_sub(1)) * u64::from(state.items_per_page) + 1;
        let end_index = (start_index + items_on_page as u64).saturating_sub(1);

        Self {
            buttons: page_strip(state.current_page, state.max_page_reached),
            current_page: state.current_page,
            can_go_prev: state.can_go_prev(),
            can_go_next: state.can_go_next(),
            start_index,
            end_index,
            visible: items_on_page > 0,
        }
    }

    /// Render the strip as text, marking the current page
    pub fn render(&self) -> String {
        self.buttons
            .iter()
            .map(|button| match button {
                PageButton::Page(page) if *page == self.current_page => format!("[{page}]"),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
