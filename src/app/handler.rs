//! Event handling and state transitions.
//!
//! [`handle_event`] is the single entry point the runtime calls. It mutates
//! the controller and returns `(should_render, actions)`.
//!
//! # Event Types
//!
//! - **Pagination**: `SetPagination`, `SetPageIndex`, `SetPageSize`,
//!   `FirstPage`, `PreviousPage`, `NextPage`, `LastPage`
//! - **Sorting**: `SetSorting`, `ToggleSort`
//! - **Filtering**: `SetColumnFilter`, `RemoveColumnFilter`,
//!   `SetColumnFilters`, `ResetColumnFilters`, `SetGlobalFilter`
//! - **View**: `ToggleColumnVisibility`, `SetColumnVisibility`,
//!   `ToggleRowSelected`, `SetRowSelection`, `ClearRowSelection`
//! - **Navigation**: `Back`, `Forward`, `LocationChanged`
//! - **System**: `Tick`, `Refetch`, `FetchCompleted`

use super::controller::TableController;
use super::Action;
use crate::domain::{
    ColumnFilter, ColumnFiltersState, PaginationState, Result, RowSelectionState, SortingState,
    VisibilityState,
};
use crate::query::FetchOutcome;
use crate::sync::History;
use std::time::Instant;
use url::Url;

/// Something that happened to a mounted table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<T> {
    SetPagination(PaginationState),
    /// Jumps to a zero-based page.
    SetPageIndex(usize),
    SetPageSize(usize),
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,

    SetSorting(SortingState),
    /// Column header click. `multi` adds to the existing sort keys.
    ToggleSort {
        column_id: String,
        multi: bool,
    },

    SetColumnFilter(ColumnFilter),
    RemoveColumnFilter(String),
    SetColumnFilters(ColumnFiltersState),
    ResetColumnFilters,
    SetGlobalFilter(String),

    ToggleColumnVisibility(String),
    SetColumnVisibility(VisibilityState),
    ToggleRowSelected(String),
    SetRowSelection(RowSelectionState),
    ClearRowSelection,

    /// History back button.
    Back,
    /// History forward button.
    Forward,
    /// The location changed outside the controller.
    LocationChanged(Url),

    /// Timer tick. Flushes due URL writes and issues due fetches.
    Tick,
    /// Retry the current page.
    Refetch,
    FetchCompleted(FetchOutcome<T>),
}

impl<T> TableEvent<T> {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetPagination(_) => "set_pagination",
            Self::SetPageIndex(_) => "set_page_index",
            Self::SetPageSize(_) => "set_page_size",
            Self::FirstPage => "first_page",
            Self::PreviousPage => "previous_page",
            Self::NextPage => "next_page",
            Self::LastPage => "last_page",
            Self::SetSorting(_) => "set_sorting",
            Self::ToggleSort { .. } => "toggle_sort",
            Self::SetColumnFilter(_) => "set_column_filter",
            Self::RemoveColumnFilter(_) => "remove_column_filter",
            Self::SetColumnFilters(_) => "set_column_filters",
            Self::ResetColumnFilters => "reset_column_filters",
            Self::SetGlobalFilter(_) => "set_global_filter",
            Self::ToggleColumnVisibility(_) => "toggle_column_visibility",
            Self::SetColumnVisibility(_) => "set_column_visibility",
            Self::ToggleRowSelected(_) => "toggle_row_selected",
            Self::SetRowSelection(_) => "set_row_selection",
            Self::ClearRowSelection => "clear_row_selection",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::LocationChanged(_) => "location_changed",
            Self::Tick => "tick",
            Self::Refetch => "refetch",
            Self::FetchCompleted(_) => "fetch_completed",
        }
    }
}

/// Processes an event and returns `(should_render, actions)`.
///
/// State-changing events settle the controller: the page-reset rule is
/// applied, a fetch is emitted if the new state is not cached, and a URL
/// write is staged. A fetch caused by a search or filter change is held
/// back and emitted by the first `Tick` past the debounce window. Events
/// that change nothing return `(false, [])`.
///
/// # Errors
///
/// Returns [`TableSyncError::Validation`](crate::TableSyncError::Validation)
/// when a sort or filter names a column the table does not have.
///
/// # Example
///
/// ```
/// use std::time::Instant;
/// use tablesync::app::{handle_event, TableController, TableEvent};
/// use tablesync::domain::TableState;
/// use tablesync::sync::MemoryHistory;
/// use tablesync::Config;
///
/// let config = Config::default();
/// let history = MemoryHistory::parse("https://app.test/users?page=3")?;
/// let mut table: TableController<_, serde_json::Value> =
///     TableController::mount(&config, history, TableState::default());
/// table.start(Instant::now());
///
/// let (render, actions) = handle_event(&mut table, TableEvent::NextPage, Instant::now())?;
/// assert!(render);
/// assert_eq!(actions.len(), 1);
/// assert_eq!(table.state().pagination.page_index, 3);
/// # Ok::<(), tablesync::TableSyncError>(())
/// ```
pub fn handle_event<H: History, T>(
    table: &mut TableController<H, T>,
    event: TableEvent<T>,
    now: Instant,
) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = event.name()).entered();

    let changed = match event {
        TableEvent::SetPagination(pagination) => table.store_mut().set_pagination(pagination),
        TableEvent::SetPageIndex(index) => table.store_mut().set_page_index(index),
        TableEvent::SetPageSize(size) => table.store_mut().set_page_size(size),
        TableEvent::FirstPage => table.store_mut().first_page(),
        TableEvent::PreviousPage => table.store_mut().previous_page(),
        TableEvent::NextPage => table.store_mut().next_page(),
        TableEvent::LastPage => table.store_mut().last_page(),

        TableEvent::SetSorting(sorting) => {
            for sort in &sorting {
                table.check_column(&sort.column_id)?;
            }
            table.store_mut().set_sorting(sorting)
        }
        TableEvent::ToggleSort { column_id, multi } => {
            table.check_column(&column_id)?;
            table.store_mut().toggle_sort(&column_id, multi)
        }

        TableEvent::SetColumnFilter(filter) => {
            table.check_column(&filter.column_id)?;
            table.store_mut().set_column_filter(filter)
        }
        TableEvent::RemoveColumnFilter(column_id) => table.store_mut().remove_column_filter(&column_id),
        TableEvent::SetColumnFilters(filters) => {
            for filter in &filters {
                table.check_column(&filter.column_id)?;
            }
            table.store_mut().set_column_filters(filters)
        }
        TableEvent::ResetColumnFilters => table.store_mut().reset_column_filters(),
        TableEvent::SetGlobalFilter(filter) => table.store_mut().set_global_filter(filter),

        TableEvent::ToggleColumnVisibility(column_id) => {
            return Ok((table.store_mut().toggle_column_visibility(&column_id), vec![]));
        }
        TableEvent::SetColumnVisibility(visibility) => {
            return Ok((table.store_mut().set_column_visibility(visibility), vec![]));
        }
        TableEvent::ToggleRowSelected(row_id) => {
            return Ok((table.store_mut().toggle_row_selected(&row_id), vec![]));
        }
        TableEvent::SetRowSelection(selection) => {
            return Ok((table.store_mut().set_row_selection(selection), vec![]));
        }
        TableEvent::ClearRowSelection => {
            return Ok((table.store_mut().clear_row_selection(), vec![]));
        }

        TableEvent::Back => {
            let Some(url) = table.history_mut().back().cloned() else {
                tracing::debug!("already at the first history entry");
                return Ok((false, vec![]));
            };
            return Ok((true, table.follow_location(&url, now)));
        }
        TableEvent::Forward => {
            let Some(url) = table.history_mut().forward().cloned() else {
                tracing::debug!("already at the last history entry");
                return Ok((false, vec![]));
            };
            return Ok((true, table.follow_location(&url, now)));
        }
        TableEvent::LocationChanged(url) => {
            return Ok((true, table.follow_location(&url, now)));
        }

        TableEvent::Tick => {
            if let Some(url) = table.poll_url(now) {
                tracing::trace!(url = %url, "url write flushed on tick");
            }
            let actions = table.poll_fetch(now);
            return Ok((!actions.is_empty(), actions));
        }
        TableEvent::Refetch => {
            return Ok((true, table.refetch().into_iter().collect()));
        }
        TableEvent::FetchCompleted(outcome) => {
            let (render, notice) = table.complete(outcome);
            return Ok((render, notice.into_iter().collect()));
        }
    };

    if !changed {
        tracing::trace!("event left state unchanged");
        return Ok((false, vec![]));
    }
    Ok((true, table.settle(now)))
}
