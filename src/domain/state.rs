//! Table state model.
//!
//! [`TableState`] is the canonical in-memory state of one table instance. It is
//! plain data: ownership and mutation rules live in
//! [`TableStateStore`](crate::store::TableStateStore).

use super::filter::ColumnFilter;
use std::collections::BTreeMap;

/// Page size used when neither the caller nor the URL provides one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Current page window.
///
/// `page_index` is zero-based. The URL and the request carry the one-based
/// page number, see [`PaginationState::page_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl PaginationState {
    /// Creates a pagination window. A zero page size is bumped to one.
    #[must_use]
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Builds a window from a one-based page number. Page `0` is treated as
    /// the first page.
    #[must_use]
    pub fn from_page_number(page: usize, page_size: usize) -> Self {
        Self::new(page.saturating_sub(1), page_size)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One sort key. Order within the sorting list is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSort {
    pub column_id: String,
    pub descending: bool,
}

impl ColumnSort {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: false,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: true,
        }
    }
}

/// Ordered sort keys, primary first.
pub type SortingState = Vec<ColumnSort>;

/// Column filters, at most one per column id.
pub type ColumnFiltersState = Vec<ColumnFilter>;

/// Column id to visibility. Missing entries are visible.
pub type VisibilityState = BTreeMap<String, bool>;

/// Row id to selection flag. Missing entries are unselected.
pub type RowSelectionState = BTreeMap<String, bool>;

/// Full state of one table instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableState {
    pub pagination: PaginationState,
    pub sorting: SortingState,
    pub column_filters: ColumnFiltersState,
    pub global_filter: String,
    pub column_visibility: VisibilityState,
    pub row_selection: RowSelectionState,
}

impl TableState {
    /// Returns `true` if any filter predicate (global or per-column) is set.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.global_filter.trim().is_empty() || !self.column_filters.is_empty()
    }

    /// Looks up the filter for `column_id`.
    #[must_use]
    pub fn column_filter(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.column_filters.iter().find(|f| f.column_id == column_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_is_one_based() {
        let p = PaginationState::new(0, 10);
        assert_eq!(p.page_number(), 1);
        assert_eq!(PaginationState::from_page_number(3, 25).page_index, 2);
        assert_eq!(PaginationState::from_page_number(0, 25).page_index, 0);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(PaginationState::new(2, 0).page_size, 1);
    }
}
