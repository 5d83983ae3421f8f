//! Paginated server-side fetching.
//!
//! - [`params`]: deterministic request parameters from a table state
//! - [`manager`]: cache, supersession and the page-reset rule
//! - [`fetch`]: the async [`Fetcher`] boundary

pub mod fetch;
pub mod manager;
pub mod params;

pub use fetch::{dispatch, Fetcher};
pub use manager::{
    FetchOutcome, FetchRequest, QueryDirective, QueryKey, QueryManager, QueryResult, QueryStatus,
};
pub use params::{
    build_filter_expression, build_query_params, build_sort_expression, QueryOptions, QueryParams,
};
