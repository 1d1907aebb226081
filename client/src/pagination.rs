//! Page arithmetic for result and report listings.

/// One slot in a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u32),
    Gap,
}

/// Controls with this many pages or fewer list every page.
const COMPACT_LIMIT: u32 = 7;

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size)) as u32
}

/// Index (1-based, across pages) of the first item on `page`.
pub fn first_index(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size) + 1
}

/// Page numbers to render: the first, the last, and the current page's
/// neighbours, with gaps where pages are skipped.
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageMarker> {
    if total_pages <= COMPACT_LIMIT {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let current = current.clamp(1, total_pages);
    let mut markers = vec![PageMarker::Page(1)];
    if current > 3 {
        markers.push(PageMarker::Gap);
    }
    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total_pages - 1);
    markers.extend((start..=end).map(PageMarker::Page));
    if current < total_pages - 2 {
        markers.push(PageMarker::Gap);
    }
    markers.push(PageMarker::Page(total_pages));
    markers
}

/// Footer text such as "Showing 1 to 4 of 10 results".
pub fn showing_range(page: u32, page_size: u32, total: u64) -> String {
    if total == 0 {
        return "No results".to_string();
    }
    let start = first_index(page, page_size).min(total);
    let end = (u64::from(page) * u64::from(page_size)).min(total);
    format!("Showing {} to {} of {} results", start, end, total)
}
