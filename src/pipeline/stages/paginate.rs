//! Pagination stage: slices the sorted rows into the requested page.

use crate::pipeline::state::PaginationState;
use std::ops::Range;

/// `max(1, ceil(rows / page_size))`. A `page_size` of 0 is treated as 1.
pub fn page_count(rows: usize, page_size: usize) -> usize {
    rows.div_ceil(page_size.max(1)).max(1)
}

/// Index range of page `page_index` within `len` rows. Empty when past the end.
pub fn window(len: usize, pagination: &PaginationState) -> Range<usize> {
    let size = pagination.page_size.max(1);
    let start = pagination.page_index.saturating_mul(size).min(len);
    let end = start.saturating_add(size).min(len);
    start..end
}

/// The visible page of a row model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWindow {
    pub rows: Vec<usize>,
    pub page_index: usize,
    pub page_count: usize,
}

/// Slice `input` to the page described by `pagination`.
///
/// The executor clamps `page_index` before calling this, so an out-of-range
/// index here only yields an empty window.
pub fn apply(input: &[usize], pagination: &PaginationState) -> PageWindow {
    PageWindow {
        rows: input[window(input.len(), pagination)].to_vec(),
        page_index: pagination.page_index,
        page_count: page_count(input.len(), pagination.page_size),
    }
}
