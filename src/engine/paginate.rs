/// Current page (1-based) and rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
}

impl PageState {
    pub fn new(current_page: usize, page_size: usize) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Pull the current page back into `1..=total_pages`.
    pub fn clamp(&mut self, total_pages: usize) {
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// One page of rows plus the numbers needed to render pagination controls.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Slice out page `page` (1-based) of `rows`.
///
/// A zero page size counts as 1 and page 0 indexes like page 1. Pages past the
/// end yield no items but still report the clamped indices.
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let count = rows.len();
    let page_size = page_size.max(1);
    let total_pages = total_pages(count, page_size);

    let start_index = page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(count);
    let end_index = start_index.saturating_add(page_size).min(count);

    let items = if count == 0 || page > total_pages {
        &rows[0..0]
    } else {
        &rows[start_index..end_index]
    };

    Page {
        items,
        total_pages,
        start_index,
        end_index,
    }
}
