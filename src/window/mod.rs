use std::ops::Range;

/// Which rows of a fixed-row-height list to materialize for a scroll position.
///
/// A pure function of its inputs; recompute on every scroll or resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    /// Rows that fit in the viewport, rounded up.
    pub visible_rows: usize,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    /// Reserved scroll height for all `N` rows.
    pub total_height: u64,
    /// Translation applied to the first materialized row.
    pub offset: u64,
}

impl ListWindow {
    /// Compute the window for `item_count` rows of `row_height`, `buffer` extra
    /// rows on each side, scroll offset `scroll` and viewport height `viewport`.
    ///
    /// A zero row height yields an empty window.
    pub fn compute(
        item_count: usize,
        row_height: u32,
        buffer: usize,
        scroll: u64,
        viewport: u32,
    ) -> Self {
        if row_height == 0 {
            return Self {
                visible_rows: 0,
                start_index: 0,
                end_index: 0,
                total_height: 0,
                offset: 0,
            };
        }

        let h = u64::from(row_height);
        let visible_rows = viewport.div_ceil(row_height) as usize;
        let first = usize::try_from(scroll / h).unwrap_or(usize::MAX);
        let start_index = first.saturating_sub(buffer);
        let end_index = item_count.min(
            start_index
                .saturating_add(visible_rows)
                .saturating_add(buffer.saturating_mul(2)),
        );

        Self {
            visible_rows,
            start_index,
            end_index,
            total_height: item_count as u64 * h,
            offset: start_index as u64 * h,
        }
    }

    /// Indices to materialize. Empty when scrolled past the end.
    pub fn range(&self) -> Range<usize> {
        self.start_index.min(self.end_index)..self.end_index
    }

    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}
