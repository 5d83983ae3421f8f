//! Table-handle conveniences built on the store setters.
//!
//! These are what a table renderer binds its pagination buttons, column
//! headers, filter inputs and checkboxes to. Each one reduces to a single
//! setter call, so the snapshot rules of the store still hold.

use super::TableStateStore;
use crate::domain::{ColumnFilter, ColumnSort, PaginationState};

impl TableStateStore {
    /// Returns `true` if there is a page before the current one.
    #[must_use]
    pub fn can_previous_page(&self) -> bool {
        self.snapshot().pagination.page_index > 0
    }

    /// Returns `true` if there is a page after the current one. With an
    /// unknown page count this is always `true`.
    #[must_use]
    pub fn can_next_page(&self) -> bool {
        let index = self.snapshot().pagination.page_index;
        self.page_count().map_or(true, |count| index + 1 < count)
    }

    /// Jumps to a zero-based page, clamped to the known page count.
    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        let max_index = self.page_count().map_or(usize::MAX, |c| c.saturating_sub(1));
        let page_index = page_index.min(max_index);
        self.update_pagination(|p| p.page_index = page_index)
    }

    pub fn first_page(&mut self) -> bool {
        self.set_page_index(0)
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.can_previous_page() {
            return false;
        }
        let index = self.snapshot().pagination.page_index;
        self.set_page_index(index - 1)
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_next_page() {
            return false;
        }
        let index = self.snapshot().pagination.page_index;
        self.set_page_index(index + 1)
    }

    /// Jumps to the last known page. No-op while the page count is unknown.
    pub fn last_page(&mut self) -> bool {
        match self.page_count() {
            Some(count) => self.set_page_index(count.saturating_sub(1)),
            None => false,
        }
    }

    /// Changes the page size, keeping the first visible row on screen.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let current = self.snapshot().pagination;
        let page_size = page_size.max(1);
        let top_row = current.page_index * current.page_size;
        self.set_pagination(PaginationState::new(top_row / page_size, page_size))
    }

    /// Cycles a column through ascending, descending and unsorted.
    ///
    /// With `multi` the column is added to (or cycled within) the existing
    /// sort keys; otherwise it replaces them.
    pub fn toggle_sort(&mut self, column_id: &str, multi: bool) -> bool {
        self.update_sorting(|sorting| {
            let position = sorting.iter().position(|s| s.column_id == column_id);
            let next = match position.map(|i| sorting[i].descending) {
                None => Some(ColumnSort::asc(column_id)),
                Some(false) => Some(ColumnSort::desc(column_id)),
                Some(true) => None,
            };
            if !multi {
                sorting.clear();
                sorting.extend(next);
                return;
            }
            match (position, next) {
                (Some(i), Some(sort)) => sorting[i] = sort,
                (Some(i), None) => {
                    sorting.remove(i);
                }
                (None, Some(sort)) => sorting.push(sort),
                (None, None) => {}
            }
        })
    }

    /// Sets or replaces the filter for the filter's column.
    pub fn set_column_filter(&mut self, filter: ColumnFilter) -> bool {
        self.update_column_filters(|filters| {
            filters.retain(|f| f.column_id != filter.column_id);
            filters.push(filter);
        })
    }

    /// Removes the filter for `column_id`, if any.
    pub fn remove_column_filter(&mut self, column_id: &str) -> bool {
        self.update_column_filters(|filters| filters.retain(|f| f.column_id != column_id))
    }

    /// Clears every column filter. The global filter is left alone.
    pub fn reset_column_filters(&mut self) -> bool {
        self.set_column_filters(Vec::new())
    }

    #[must_use]
    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.snapshot()
            .column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) -> bool {
        let visible = self.is_column_visible(column_id);
        self.update_column_visibility(|v| {
            v.insert(column_id.to_string(), !visible);
        })
    }

    pub fn toggle_row_selected(&mut self, row_id: &str) -> bool {
        self.update_row_selection(|selection| {
            if selection.get(row_id).copied().unwrap_or(false) {
                selection.remove(row_id);
            } else {
                selection.insert(row_id.to_string(), true);
            }
        })
    }

    /// Selects or deselects every row id given (typically the current page).
    pub fn select_all_on_page<I, S>(&mut self, row_ids: I, selected: bool) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_row_selection(|selection| {
            for id in row_ids {
                let id = id.into();
                if selected {
                    selection.insert(id, true);
                } else {
                    selection.remove(&id);
                }
            }
        })
    }

    pub fn clear_row_selection(&mut self) -> bool {
        self.set_row_selection(Default::default())
    }

    /// Ids of selected rows, in id order.
    #[must_use]
    pub fn selected_row_ids(&self) -> Vec<String> {
        self.snapshot()
            .row_selection
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
