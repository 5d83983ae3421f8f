//! Single source of truth for one table instance.
//!
//! [`TableStateStore`] owns the [`TableState`]. Every mutation goes through a
//! setter pair, `set_*(value)` or `update_*(|old| new)`, and produces a fresh
//! immutable snapshot behind an [`Arc`]. Consumers that keep the previous
//! snapshot can detect change by pointer identity; a setter that would not
//! change anything keeps the old snapshot, so identity is stable across no-op
//! updates.
//!
//! The URL sync layer and the query manager never hold a mutable reference to
//! the state. They read snapshots and ask the controller to call these setters.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tablesync::domain::{ColumnSort, TableState};
//! use tablesync::store::TableStateStore;
//!
//! let mut store = TableStateStore::new(TableState::default());
//! let before = store.state();
//! store.update_pagination(|p| p.page_index = 3);
//! store.set_sorting(vec![ColumnSort::desc("name")]);
//! assert!(!Arc::ptr_eq(&before, &store.state()));
//! assert_eq!(store.state().pagination.page_number(), 4);
//! ```

mod helpers;

use crate::domain::{
    ColumnFilter, ColumnFiltersState, PaginationState, RowSelectionState, SortingState, TableState,
    VisibilityState,
};
use std::sync::Arc;

/// Owner of one table's state.
#[derive(Debug, Clone)]
pub struct TableStateStore {
    state: Arc<TableState>,
    /// Page count reported by the last successful fetch, if any.
    page_count: Option<usize>,
    revision: u64,
}

impl TableStateStore {
    /// Creates a store seeded with `initial`.
    #[must_use]
    pub fn new(initial: TableState) -> Self {
        let mut initial = initial;
        initial.pagination = PaginationState::new(initial.pagination.page_index, initial.pagination.page_size);
        initial.column_filters = dedupe_filters(initial.column_filters);
        Self {
            state: Arc::new(initial),
            page_count: None,
            revision: 0,
        }
    }

    /// Current immutable snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<TableState> {
        Arc::clone(&self.state)
    }

    /// Borrow of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &TableState {
        &self.state
    }

    /// Number of snapshots produced since creation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the whole state in one step.
    pub fn set_state(&mut self, state: TableState) -> bool {
        self.commit("state", move |s| *s = state)
    }

    /// Replaces pagination. Page index and page size land in the same
    /// snapshot.
    pub fn set_pagination(&mut self, pagination: PaginationState) -> bool {
        let normalized = PaginationState::new(pagination.page_index, pagination.page_size);
        self.commit("pagination", |s| s.pagination = normalized)
    }

    /// Updates pagination from its previous value.
    pub fn update_pagination(&mut self, f: impl FnOnce(&mut PaginationState)) -> bool {
        let mut next = self.state.pagination;
        f(&mut next);
        self.set_pagination(next)
    }

    /// Replaces the sort keys.
    pub fn set_sorting(&mut self, sorting: SortingState) -> bool {
        self.commit("sorting", |s| s.sorting = sorting)
    }

    /// Updates the sort keys from their previous value.
    pub fn update_sorting(&mut self, f: impl FnOnce(&mut SortingState)) -> bool {
        let mut next = self.state.sorting.clone();
        f(&mut next);
        self.set_sorting(next)
    }

    /// Replaces the column filters. If a column appears twice the later entry
    /// wins.
    pub fn set_column_filters(&mut self, filters: ColumnFiltersState) -> bool {
        let filters = dedupe_filters(filters);
        self.commit("column_filters", |s| s.column_filters = filters)
    }

    /// Updates the column filters from their previous value.
    pub fn update_column_filters(&mut self, f: impl FnOnce(&mut ColumnFiltersState)) -> bool {
        let mut next = self.state.column_filters.clone();
        f(&mut next);
        self.set_column_filters(next)
    }

    /// Replaces the global filter.
    pub fn set_global_filter(&mut self, filter: impl Into<String>) -> bool {
        let filter = filter.into();
        self.commit("global_filter", |s| s.global_filter = filter)
    }

    /// Updates the global filter from its previous value.
    pub fn update_global_filter(&mut self, f: impl FnOnce(&mut String)) -> bool {
        let mut next = self.state.global_filter.clone();
        f(&mut next);
        self.set_global_filter(next)
    }

    /// Replaces column visibility.
    pub fn set_column_visibility(&mut self, visibility: VisibilityState) -> bool {
        self.commit("column_visibility", |s| s.column_visibility = visibility)
    }

    /// Updates column visibility from its previous value.
    pub fn update_column_visibility(&mut self, f: impl FnOnce(&mut VisibilityState)) -> bool {
        let mut next = self.state.column_visibility.clone();
        f(&mut next);
        self.set_column_visibility(next)
    }

    /// Replaces row selection.
    pub fn set_row_selection(&mut self, selection: RowSelectionState) -> bool {
        self.commit("row_selection", |s| s.row_selection = selection)
    }

    /// Updates row selection from its previous value.
    pub fn update_row_selection(&mut self, f: impl FnOnce(&mut RowSelectionState)) -> bool {
        let mut next = self.state.row_selection.clone();
        f(&mut next);
        self.set_row_selection(next)
    }

    /// Records the page count reported by the server.
    pub fn set_page_count(&mut self, page_count: Option<usize>) {
        self.page_count = page_count;
    }

    /// Page count reported by the server, if known.
    #[must_use]
    pub const fn page_count(&self) -> Option<usize> {
        self.page_count
    }

    fn commit(&mut self, slice: &'static str, mutate: impl FnOnce(&mut TableState)) -> bool {
        let mut next = (*self.state).clone();
        mutate(&mut next);
        if next == *self.state {
            tracing::trace!(slice, "state unchanged, keeping snapshot");
            return false;
        }
        self.state = Arc::new(next);
        self.revision += 1;
        tracing::debug!(slice, revision = self.revision, "table state updated");
        true
    }
}

impl Default for TableStateStore {
    fn default() -> Self {
        Self::new(TableState::default())
    }
}

/// Keeps one filter per column, the last one given.
fn dedupe_filters(filters: Vec<ColumnFilter>) -> Vec<ColumnFilter> {
    let mut out: Vec<ColumnFilter> = Vec::with_capacity(filters.len());
    for filter in filters {
        if let Some(existing) = out.iter_mut().find(|f| f.column_id == filter.column_id) {
            *existing = filter;
        } else {
            out.push(filter);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnSort, FilterValue};

    #[test]
    fn no_op_update_keeps_snapshot_identity() {
        let mut store = TableStateStore::default();
        let before = store.state();
        assert!(!store.set_pagination(PaginationState::default()));
        assert!(!store.update_sorting(|_| {}));
        assert!(Arc::ptr_eq(&before, &store.state()));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn pagination_updates_atomically() {
        let mut store = TableStateStore::default();
        let before = store.state();
        assert!(store.set_pagination(PaginationState::new(2, 50)));
        let after = store.state();
        assert_eq!(after.pagination, PaginationState::new(2, 50));
        assert_eq!(before.pagination, PaginationState::default());
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn pagination_is_normalized() {
        let mut store = TableStateStore::default();
        store.update_pagination(|p| p.page_size = 0);
        assert_eq!(store.snapshot().pagination.page_size, 1);
    }

    #[test]
    fn filters_are_keyed_by_column() {
        let mut store = TableStateStore::default();
        store.set_column_filters(vec![
            ColumnFilter::new("status", FilterValue::Select("a".into())),
            ColumnFilter::new("status", FilterValue::Select("b".into())),
        ]);
        let state = store.state();
        assert_eq!(state.column_filters.len(), 1);
        assert_eq!(state.column_filters[0].value, FilterValue::Select("b".into()));
    }

    #[test]
    fn update_sees_previous_value() {
        let mut store = TableStateStore::default();
        store.set_sorting(vec![ColumnSort::asc("name")]);
        store.update_sorting(|s| s.push(ColumnSort::desc("email")));
        assert_eq!(
            store.snapshot().sorting,
            vec![ColumnSort::asc("name"), ColumnSort::desc("email")]
        );
    }
}
