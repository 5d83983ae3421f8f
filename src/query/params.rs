//! Request parameter construction.
//!
//! [`build_query_params`] is a pure function of the table state and a few
//! naming options. Its output order is fixed (search, filter, sort, page,
//! perPage) so identical state always serializes to identical bytes.

use crate::domain::{ColumnFilter, ColumnSort, TableState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter names and formatting for fetch requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Namespace mixed into every cache key, e.g. the resource name.
    pub namespace: String,
    pub page_key: String,
    pub per_page_key: String,
    pub sort_key: String,
    pub search_key: String,
    pub filter_key: String,
    /// String joining filter clauses.
    pub conjunction: String,
    /// Cached pages kept before the least recently used are dropped.
    pub max_entries: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            namespace: "table".to_string(),
            page_key: "page".to_string(),
            per_page_key: "perPage".to_string(),
            sort_key: "sort".to_string(),
            search_key: "search".to_string(),
            filter_key: "filter".to_string(),
            conjunction: " and ".to_string(),
            max_entries: 50,
        }
    }
}

/// Ordered request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form-encoded query string, without a leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.0)
            .finish()
    }

    /// Parses a form-encoded query string (leading `?` allowed).
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Joins the active filters into `"<column> <operator> <value>"` clauses.
///
/// Filters with an empty payload or an operator their variant does not
/// permit are left out. Returns `None` when nothing remains.
///
/// # Example
///
/// ```
/// use tablesync::domain::{ColumnFilter, FilterOperator, FilterValue};
/// use tablesync::query::build_filter_expression;
///
/// let filters = vec![
///     ColumnFilter::new("status", FilterValue::Select("active".into())),
///     ColumnFilter::new("age", FilterValue::Number("18".into())).with_operator(FilterOperator::GreaterThan),
/// ];
/// assert_eq!(
///     build_filter_expression(&filters, " and ").as_deref(),
///     Some("status eq active and age gt 18")
/// );
/// ```
#[must_use]
pub fn build_filter_expression(filters: &[ColumnFilter], conjunction: &str) -> Option<String> {
    let clauses: Vec<String> = filters
        .iter()
        .filter(|f| {
            let active = f.is_active();
            if !active {
                tracing::trace!(column = %f.column_id, operator = %f.operator, "filter left out of expression");
            }
            active
        })
        .map(|f| format!("{} {} {}", f.column_id, f.operator, f.value.render()))
        .collect();
    (!clauses.is_empty()).then(|| clauses.join(conjunction))
}

/// Joins sort keys into `"<column>:asc|desc"` entries separated by commas.
#[must_use]
pub fn build_sort_expression(sorting: &[ColumnSort]) -> Option<String> {
    if sorting.is_empty() {
        return None;
    }
    Some(
        sorting
            .iter()
            .map(|s| format!("{}:{}", s.column_id, if s.descending { "desc" } else { "asc" }))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Builds the request parameters for `state`.
///
/// Order: search (if non-blank), filter (if any active filter), sort (if
/// any), then page (one-based) and page size, which are always present.
#[must_use]
pub fn build_query_params(state: &TableState, options: &QueryOptions) -> QueryParams {
    let mut params = QueryParams::new();

    let search = state.global_filter.trim();
    if !search.is_empty() {
        params.push(&options.search_key, search);
    }
    if let Some(filter) = build_filter_expression(&state.column_filters, &options.conjunction) {
        params.push(&options.filter_key, filter);
    }
    if let Some(sort) = build_sort_expression(&state.sorting) {
        params.push(&options.sort_key, sort);
    }
    params.push(&options.page_key, state.pagination.page_number().to_string());
    params.push(&options.per_page_key, state.pagination.page_size.to_string());
    params
}
