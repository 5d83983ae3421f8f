//! Domain layer: table state, filter model and errors.
//!
//! These types are independent of the URL, the history backend and the fetch
//! transport. Everything else in the crate reads or produces them.
//!
//! - [`error`]: error types and result alias
//! - [`filter`]: column filter variants, operators and payloads
//! - [`state`]: table state (pagination, sorting, filters, visibility, selection)
//! - [`page`]: a page of rows returned by a fetch

pub mod error;
pub mod filter;
pub mod page;
pub mod state;

pub use error::{FetchError, Result, TableSyncError};
pub use filter::{ColumnFilter, FilterOperator, FilterValue, FilterVariant};
pub use page::Page;
pub use state::{
    ColumnFiltersState, ColumnSort, PaginationState, RowSelectionState, SortingState, TableState,
    VisibilityState, DEFAULT_PAGE_SIZE,
};
