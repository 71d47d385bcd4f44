//! Page-number windows and index ranges for paged list views.
//!
//! [`PaginationEngine`] owns the current page of a list whose total size and
//! page size are known. It never performs I/O: views read the derived fields
//! (`start_index`, `visible_pages`, ...) and drive it through the navigation
//! actions, optionally observing changes through a callback.

use std::fmt;

use shared::protocol::{PageInfo, PageToken};
use tracing::trace;

use crate::error::{CurationError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_MAX_VISIBLE_PAGES: usize = 5;
pub const MIN_VISIBLE_PAGES: usize = 3;

/// Construction inputs for [`PaginationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    pub initial_page: Option<i64>,
    pub total_count: i64,
    pub page_size: i64,
    pub max_visible_pages: usize,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            initial_page: None,
            total_count: 0,
            page_size: DEFAULT_PAGE_SIZE,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
        }
    }
}

impl PaginationOptions {
    pub fn new(total_count: i64, page_size: i64) -> Self {
        Self {
            total_count,
            page_size,
            ..Self::default()
        }
    }

    pub fn initial_page(mut self, page: i64) -> Self {
        self.initial_page = Some(page);
        self
    }

    pub fn max_visible_pages(mut self, max_visible_pages: usize) -> Self {
        self.max_visible_pages = max_visible_pages;
        self
    }
}

type PageChangeCallback = Box<dyn FnMut(i64) + Send>;

pub struct PaginationEngine {
    total_count: i64,
    page_size: i64,
    max_visible_pages: usize,
    initial_page: i64,
    current_page: i64,
    total_pages: i64,
    on_page_change: Option<PageChangeCallback>,
}

impl fmt::Debug for PaginationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("total_count", &self.total_count)
            .field("page_size", &self.page_size)
            .field("max_visible_pages", &self.max_visible_pages)
            .field("current_page", &self.current_page)
            .field("total_pages", &self.total_pages)
            .field("on_page_change", &self.on_page_change.is_some())
            .finish()
    }
}

impl PaginationEngine {
    /// Validates `options` and positions the engine on the clamped initial
    /// page. Invalid inputs are rejected here and never later.
    pub fn new(options: PaginationOptions) -> Result<Self> {
        validate_total_count(options.total_count)?;
        validate_page_size(options.page_size)?;
        if options.max_visible_pages < MIN_VISIBLE_PAGES {
            return Err(CurationError::InvalidConfiguration(format!(
                "max_visible_pages must be at least {MIN_VISIBLE_PAGES}, got {}",
                options.max_visible_pages
            )));
        }

        let total_pages = total_pages_for(options.total_count, options.page_size);
        let initial_page = options.initial_page.unwrap_or(1);
        Ok(Self {
            total_count: options.total_count,
            page_size: options.page_size,
            max_visible_pages: options.max_visible_pages,
            initial_page,
            current_page: initial_page.clamp(1, total_pages),
            total_pages,
            on_page_change: None,
        })
    }

    /// Installs the callback invoked once per actual page change.
    pub fn on_page_change(mut self, callback: impl FnMut(i64) + Send + 'static) -> Self {
        self.on_page_change = Some(Box::new(callback));
        self
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn max_visible_pages(&self) -> usize {
        self.max_visible_pages
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    /// Zero-based index of the first item on the current page.
    pub fn start_index(&self) -> i64 {
        (self.current_page - 1) * self.page_size
    }

    /// Zero-based index of the last item on the current page, or `None` for
    /// an empty list.
    pub fn end_index(&self) -> Option<i64> {
        if self.total_count == 0 {
            return None;
        }
        Some((self.start_index() + self.page_size - 1).min(self.total_count - 1))
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn visible_pages(&self) -> Vec<PageToken> {
        page_window(self.current_page, self.total_pages, self.max_visible_pages)
    }

    /// The current page's portion of an in-memory list.
    pub fn page_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.start_index())
            .unwrap_or(usize::MAX)
            .min(items.len());
        let len = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(items.len());
        &items[start..end]
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            start_index: self.start_index(),
            end_index: self.end_index(),
            has_prev_page: self.has_prev_page(),
            has_next_page: self.has_next_page(),
            visible_pages: self.visible_pages(),
        }
    }

    pub fn set_page(&mut self, page: i64) -> bool {
        let target = page.clamp(1, self.total_pages);
        if target == self.current_page {
            return false;
        }
        trace!(from = self.current_page, to = target, "page changed");
        self.current_page = target;
        if let Some(callback) = self.on_page_change.as_mut() {
            callback(target);
        }
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.set_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev_page() {
            return false;
        }
        self.set_page(self.current_page - 1)
    }

    pub fn go_to_first_page(&mut self) -> bool {
        self.set_page(1)
    }

    pub fn go_to_last_page(&mut self) -> bool {
        self.set_page(self.total_pages)
    }

    /// Returns to the initial page, clamped against the current page count.
    pub fn reset(&mut self) -> bool {
        self.set_page(self.initial_page)
    }

    /// Replaces the total item count and re-clamps the current page.
    pub fn set_total_count(&mut self, total_count: i64) -> Result<bool> {
        validate_total_count(total_count)?;
        self.total_count = total_count;
        Ok(self.recompute_total_pages())
    }

    /// Replaces the page size and re-clamps the current page.
    pub fn set_page_size(&mut self, page_size: i64) -> Result<bool> {
        validate_page_size(page_size)?;
        self.page_size = page_size;
        Ok(self.recompute_total_pages())
    }

    fn recompute_total_pages(&mut self) -> bool {
        self.total_pages = total_pages_for(self.total_count, self.page_size);
        self.set_page(self.current_page)
    }
}

/// `max(1, ceil(total_count / page_size))`. Callers validate both inputs.
pub fn total_pages_for(total_count: i64, page_size: i64) -> i64 {
    let full = total_count / page_size;
    let partial = i64::from(total_count % page_size != 0);
    (full + partial).max(1)
}

/// Builds the page-number strip for `current_page`.
///
/// Short lists show every page. Longer ones always show the first and last
/// page around a middle window of `max_visible_pages - 3` slots: centred on
/// the current page with `(max_visible_pages - 3) / 2` pages on each side,
/// and pinned against the first or last page (keeping the full slot count,
/// minimum one) once it would touch either end. Gaps become
/// [`PageToken::Ellipsis`].
pub fn page_window(current_page: i64, total_pages: i64, max_visible_pages: usize) -> Vec<PageToken> {
    let total_pages = total_pages.max(1);
    let max_visible = i64::try_from(max_visible_pages).unwrap_or(i64::MAX);
    if total_pages <= max_visible {
        return (1..=total_pages).map(PageToken::Page).collect();
    }

    let current = current_page.clamp(1, total_pages);
    let middle_slots = (max_visible - 3).max(0);
    let half = middle_slots / 2;
    let pinned_width = middle_slots.max(1);

    let (start, end) = if current - half <= 2 {
        (2, (1 + pinned_width).min(total_pages - 1))
    } else if current + half >= total_pages - 1 {
        ((total_pages - pinned_width).max(2), total_pages - 1)
    } else {
        (current - half, current + half)
    };

    let mut tokens = Vec::with_capacity(max_visible_pages + 2);
    tokens.push(PageToken::Page(1));
    if start > 2 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.extend((start..=end).map(PageToken::Page));
    if end < total_pages - 1 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.push(PageToken::Page(total_pages));
    tokens
}

fn validate_total_count(total_count: i64) -> Result<()> {
    if total_count < 0 {
        return Err(CurationError::InvalidConfiguration(format!(
            "total_count must not be negative, got {total_count}"
        )));
    }
    Ok(())
}

fn validate_page_size(page_size: i64) -> Result<()> {
    if page_size <= 0 {
        return Err(CurationError::InvalidConfiguration(format!(
            "page_size must be positive, got {page_size}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
