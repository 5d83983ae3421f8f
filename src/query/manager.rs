//! Server-side page fetching keyed by table state.
//!
//! The manager never performs I/O. [`QueryManager::observe`] looks at a
//! table state and decides whether a fetch is needed. The caller runs the
//! returned [`FetchRequest`] through a [`Fetcher`](super::Fetcher) and hands
//! the outcome back to [`QueryManager::resolve`].
//!
//! ## Supersession
//!
//! Every request is tied to the [`QueryKey`] it was built from. Results for
//! a key that is no longer current are cached but never displayed, so the
//! last parameter set wins regardless of completion order.
//!
//! ## Page reset
//!
//! When the active filter signature changes while a page other than the
//! first is showing, `observe` answers [`QueryDirective::ResetPage`]
//! instead of a fetch. The caller moves the store to page 0 and observes
//! again. Until a first-page state is observed the old signature is kept,
//! so observing the stale page again answers `ResetPage` again.
//!
//! ## Eviction
//!
//! At most [`QueryOptions::max_entries`] keys are cached. Past that the
//! least recently used entry goes, except the current key and keys with a
//! request in flight.

use super::params::{build_query_params, QueryOptions, QueryParams};
use crate::codec::{Codec, FiltersCodec, SortingCodec};
use crate::domain::{ColumnFilter, FetchError, Page, TableState};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub namespace: String,
    pub page_index: usize,
    pub page_size: usize,
    pub global_filter: String,
    /// Canonical JSON of the sort keys.
    pub sorting: String,
    /// Canonical JSON of the active column filters.
    pub filters: String,
}

impl QueryKey {
    #[must_use]
    pub fn from_state(namespace: &str, state: &TableState) -> Self {
        let (global_filter, filters) = filter_signature(state);
        Self {
            namespace: namespace.to_string(),
            page_index: state.pagination.page_index,
            page_size: state.pagination.page_size,
            global_filter,
            sorting: SortingCodec::default().encode(&state.sorting),
            filters,
        }
    }
}

fn filter_signature(state: &TableState) -> (String, String) {
    let active: Vec<ColumnFilter> = state
        .column_filters
        .iter()
        .filter(|f| f.is_active())
        .cloned()
        .collect();
    (
        state.global_filter.trim().to_string(),
        FiltersCodec::default().encode(&active),
    )
}

/// A fetch the caller should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: u64,
    pub key: QueryKey,
    pub params: QueryParams,
}

/// Outcome of running a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub request_id: u64,
    pub result: Result<Page<T>, FetchError>,
}

/// What [`QueryManager::observe`] wants the caller to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryDirective {
    /// Data for this state is cached or already on its way.
    Idle,
    /// Move to the first page, then observe again.
    ResetPage,
    /// Run this request.
    Fetch(FetchRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing observed yet.
    Idle,
    /// No data for the current key and a fetch in flight.
    Loading,
    Success,
    Error,
}

/// What a renderer needs to draw the current page.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    /// Rows to show. May belong to a previous key while loading.
    pub data: Option<Arc<Page<T>>>,
    pub error: Option<FetchError>,
    /// A request for the current key is in flight.
    pub is_fetching: bool,
    /// `data` was fetched for a different key than the current one.
    pub is_stale: bool,
}

impl<T> QueryResult<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.status, QueryStatus::Error)
    }
}

#[derive(Debug)]
struct Entry<T> {
    data: Option<Arc<Page<T>>>,
    error: Option<FetchError>,
    in_flight: Option<u64>,
    last_used: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            in_flight: None,
            last_used: 0,
        }
    }
}

/// Cache of fetched pages plus the bookkeeping for the current key.
#[derive(Debug)]
pub struct QueryManager<T> {
    options: QueryOptions,
    cache: HashMap<QueryKey, Entry<T>>,
    requests: HashMap<u64, QueryKey>,
    current: Option<QueryKey>,
    signature: Option<(String, String)>,
    placeholder: Option<Arc<Page<T>>>,
    next_id: u64,
    clock: u64,
}

impl<T> QueryManager<T> {
    #[must_use]
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            cache: HashMap::new(),
            requests: HashMap::new(),
            current: None,
            signature: None,
            placeholder: None,
            next_id: 1,
            clock: 0,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// The key of the last observed state.
    #[must_use]
    pub const fn current_key(&self) -> Option<&QueryKey> {
        self.current.as_ref()
    }

    /// Decides what to do for `state`.
    ///
    /// Observing the same state twice yields [`QueryDirective::Idle`] the
    /// second time. An errored key is fetched again only when it becomes
    /// current after another key; use [`refetch`](Self::refetch) to retry.
    pub fn observe(&mut self, state: &TableState) -> QueryDirective {
        let _span = tracing::debug_span!("query_observe", namespace = %self.options.namespace).entered();

        if self.filters_changed(state) && state.pagination.page_index != 0 {
            tracing::debug!(
                page_index = state.pagination.page_index,
                "filters changed off the first page, resetting"
            );
            return QueryDirective::ResetPage;
        }
        self.signature = Some(filter_signature(state));

        let key = QueryKey::from_state(&self.options.namespace, state);
        let became_current = self.current.as_ref() != Some(&key);
        self.current = Some(key.clone());

        self.clock += 1;
        let clock = self.clock;
        let entry = self.cache.entry(key.clone()).or_default();
        entry.last_used = clock;
        if let Some(data) = &entry.data {
            self.placeholder = Some(Arc::clone(data));
        }
        let needs_fetch = entry.in_flight.is_none()
            && entry.data.is_none()
            && (entry.error.is_none() || became_current);
        if !needs_fetch {
            tracing::trace!(
                cached = entry.data.is_some(),
                in_flight = entry.in_flight.is_some(),
                "no fetch needed"
            );
            return QueryDirective::Idle;
        }

        let params = build_query_params(state, &self.options);
        let request = self.issue(key, params);
        self.evict();
        QueryDirective::Fetch(request)
    }

    /// Whether the active filters of `state` differ from the last ones
    /// observed. Always `false` before the first observation.
    #[must_use]
    pub fn filters_changed(&self, state: &TableState) -> bool {
        self.signature
            .as_ref()
            .is_some_and(|prev| *prev != filter_signature(state))
    }

    /// Takes the filters of `state` as the baseline without resetting the
    /// page. Used when the state comes from the URL rather than the user.
    pub fn rebase(&mut self, state: &TableState) {
        self.signature = Some(filter_signature(state));
    }

    fn evict(&mut self) {
        let max_entries = self.options.max_entries.max(1);
        while self.cache.len() > max_entries {
            let current = self.current.as_ref();
            let Some(oldest) = self
                .cache
                .iter()
                .filter(|(key, entry)| entry.in_flight.is_none() && Some(*key) != current)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.cache.remove(&oldest);
            tracing::trace!(page_index = oldest.page_index, "query cache entry evicted");
        }
    }

    /// Number of cached keys, including ones still loading.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Forces a new request for the current key, superseding any in flight.
    pub fn refetch(&mut self, state: &TableState) -> Option<FetchRequest> {
        let key = self.current.clone()?;
        let params = build_query_params(state, &self.options);
        Some(self.issue(key, params))
    }

    /// Drops every cached page. The visible data stays as a placeholder.
    pub fn invalidate(&mut self) {
        tracing::debug!(entries = self.cache.len(), "query cache invalidated");
        if let Some(data) = self.current_entry().and_then(|e| e.data.clone()) {
            self.placeholder = Some(data);
        }
        self.cache.clear();
        self.requests.clear();
        self.current = None;
    }

    fn issue(&mut self, key: QueryKey, params: QueryParams) -> FetchRequest {
        let id = self.next_id;
        self.next_id += 1;
        let entry = self.cache.entry(key.clone()).or_default();
        if let Some(previous) = entry.in_flight.replace(id) {
            self.requests.remove(&previous);
        }
        self.requests.insert(id, key.clone());
        tracing::debug!(request_id = id, params = %params, "fetch issued");
        FetchRequest { id, key, params }
    }

    /// Records the outcome of a request.
    ///
    /// Returns `true` if the visible result changed. Unknown or superseded
    /// request ids are ignored.
    pub fn resolve(&mut self, request_id: u64, result: Result<Page<T>, FetchError>) -> bool {
        let Some(key) = self.requests.remove(&request_id) else {
            tracing::debug!(request_id, "ignoring superseded fetch result");
            return false;
        };
        let Some(entry) = self.cache.get_mut(&key) else {
            return false;
        };
        entry.in_flight = None;
        let is_current = self.current.as_ref() == Some(&key);

        match result {
            Ok(page) => {
                tracing::debug!(request_id, total = page.total_count, is_current, "fetch succeeded");
                let page = Arc::new(page);
                entry.data = Some(Arc::clone(&page));
                entry.error = None;
                if is_current {
                    self.placeholder = Some(page);
                }
            }
            Err(error) => {
                tracing::warn!(request_id, %error, is_current, "fetch failed");
                entry.error = Some(error);
            }
        }
        is_current
    }

    /// Resolves a [`FetchOutcome`].
    pub fn apply(&mut self, outcome: FetchOutcome<T>) -> bool {
        self.resolve(outcome.request_id, outcome.result)
    }

    fn current_entry(&self) -> Option<&Entry<T>> {
        self.current.as_ref().and_then(|key| self.cache.get(key))
    }

    /// The result for the current key.
    #[must_use]
    pub fn result(&self) -> QueryResult<T> {
        let Some(entry) = self.current_entry() else {
            return QueryResult {
                status: QueryStatus::Idle,
                data: self.placeholder.clone(),
                error: None,
                is_fetching: false,
                is_stale: self.placeholder.is_some(),
            };
        };

        let is_fetching = entry.in_flight.is_some();
        let (data, is_stale) = match &entry.data {
            Some(data) => (Some(Arc::clone(data)), false),
            None => (self.placeholder.clone(), self.placeholder.is_some()),
        };
        let status = if entry.data.is_some() {
            QueryStatus::Success
        } else if entry.error.is_some() && !is_fetching {
            QueryStatus::Error
        } else if is_fetching {
            QueryStatus::Loading
        } else {
            QueryStatus::Idle
        };

        QueryResult {
            status,
            data,
            error: entry.error.clone(),
            is_fetching,
            is_stale,
        }
    }

    /// Page count of the data currently shown, if any.
    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        self.result().data.map(|page| page.last_page)
    }
}

impl<T> Default for QueryManager<T> {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterValue, PaginationState};

    fn page(items: Vec<u32>, total: u64) -> Page<u32> {
        Page {
            items,
            total_count: total,
            last_page: 5,
        }
    }

    fn expect_fetch(directive: QueryDirective) -> FetchRequest {
        match directive {
            QueryDirective::Fetch(request) => request,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn identical_state_does_not_refetch() {
        let mut manager = QueryManager::<u32>::default();
        let state = TableState::default();
        let request = expect_fetch(manager.observe(&state));
        assert_eq!(manager.observe(&state), QueryDirective::Idle);

        assert!(manager.resolve(request.id, Ok(page(vec![1], 1))));
        assert_eq!(manager.observe(&state), QueryDirective::Idle);
        assert_eq!(manager.result().status, QueryStatus::Success);
    }

    #[test]
    fn new_filter_off_first_page_resets() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState {
            pagination: PaginationState::new(4, 10),
            ..TableState::default()
        };
        expect_fetch(manager.observe(&state));

        state
            .column_filters
            .push(ColumnFilter::new("status", FilterValue::Select("active".into())));
        assert_eq!(manager.observe(&state), QueryDirective::ResetPage);

        state.pagination.page_index = 0;
        let request = expect_fetch(manager.observe(&state));
        assert_eq!(request.key.page_index, 0);
        assert_eq!(request.params.get("page"), Some("1"));
    }

    #[test]
    fn ignored_reset_is_repeated_until_first_page() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState {
            pagination: PaginationState::new(4, 10),
            ..TableState::default()
        };
        expect_fetch(manager.observe(&state));

        state.global_filter = "ann".into();
        assert_eq!(manager.observe(&state), QueryDirective::ResetPage);
        assert_eq!(manager.observe(&state), QueryDirective::ResetPage);

        state.pagination.page_index = 0;
        let request = expect_fetch(manager.observe(&state));
        assert_eq!(request.params.get("search"), Some("ann"));
        assert_eq!(request.params.get("page"), Some("1"));
    }

    #[test]
    fn rebased_filters_keep_the_page() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState::default();
        expect_fetch(manager.observe(&state));

        state.pagination.page_index = 2;
        state
            .column_filters
            .push(ColumnFilter::new("status", FilterValue::Select("active".into())));
        assert!(manager.filters_changed(&state));
        manager.rebase(&state);
        assert!(!manager.filters_changed(&state));

        let request = expect_fetch(manager.observe(&state));
        assert_eq!(request.key.page_index, 2);
        assert_eq!(request.params.get("page"), Some("3"));
    }

    #[test]
    fn inactive_filter_does_not_reset() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState {
            pagination: PaginationState::new(2, 10),
            ..TableState::default()
        };
        expect_fetch(manager.observe(&state));
        state
            .column_filters
            .push(ColumnFilter::new("name", FilterValue::Text(String::new())));
        assert_eq!(manager.observe(&state), QueryDirective::Idle);
    }

    #[test]
    fn mount_with_filters_off_first_page_fetches() {
        let mut manager = QueryManager::<u32>::default();
        let state = TableState {
            pagination: PaginationState::new(3, 10),
            global_filter: "ann".into(),
            ..TableState::default()
        };
        let request = expect_fetch(manager.observe(&state));
        assert_eq!(request.params.get("page"), Some("4"));
    }

    #[test]
    fn late_result_for_old_key_is_not_shown() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState::default();
        let first = expect_fetch(manager.observe(&state));
        state.pagination.page_index = 1;
        let second = expect_fetch(manager.observe(&state));

        assert!(manager.resolve(second.id, Ok(page(vec![20], 50))));
        assert!(!manager.resolve(first.id, Ok(page(vec![10], 50))));

        let result = manager.result();
        assert_eq!(result.data.map(|p| p.items.clone()), Some(vec![20]));
        assert!(!result.is_stale);
    }

    #[test]
    fn previous_page_stays_visible_while_loading() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState::default();
        let first = expect_fetch(manager.observe(&state));
        manager.resolve(first.id, Ok(page(vec![1, 2], 20)));

        state.pagination.page_index = 1;
        expect_fetch(manager.observe(&state));
        let result = manager.result();
        assert!(result.is_fetching);
        assert!(result.is_stale);
        assert_eq!(result.status, QueryStatus::Loading);
        assert_eq!(result.data.map(|p| p.items.clone()), Some(vec![1, 2]));
    }

    #[test]
    fn errors_surface_and_are_not_retried() {
        let mut manager = QueryManager::<u32>::default();
        let state = TableState::default();
        let request = expect_fetch(manager.observe(&state));
        manager.resolve(request.id, Err(FetchError::Network("offline".into())));

        let result = manager.result();
        assert_eq!(result.status, QueryStatus::Error);
        assert_eq!(result.error, Some(FetchError::Network("offline".into())));
        assert_eq!(manager.observe(&state), QueryDirective::Idle);

        let retry = manager.refetch(&state).unwrap();
        assert!(manager.resolve(retry.id, Ok(page(vec![3], 1))));
        assert!(manager.result().error.is_none());
    }

    #[test]
    fn refetch_supersedes_in_flight_request() {
        let mut manager = QueryManager::<u32>::default();
        let state = TableState::default();
        let first = expect_fetch(manager.observe(&state));
        let second = manager.refetch(&state).unwrap();
        assert!(!manager.resolve(first.id, Ok(page(vec![1], 1))));
        assert!(manager.resolve(second.id, Ok(page(vec![2], 1))));
    }

    #[test]
    fn returning_to_cached_key_is_instant() {
        let mut manager = QueryManager::<u32>::default();
        let mut state = TableState::default();
        let a = expect_fetch(manager.observe(&state));
        manager.resolve(a.id, Ok(page(vec![1], 20)));
        state.pagination.page_index = 1;
        let b = expect_fetch(manager.observe(&state));
        manager.resolve(b.id, Ok(page(vec![2], 20)));

        state.pagination.page_index = 0;
        assert_eq!(manager.observe(&state), QueryDirective::Idle);
        assert_eq!(manager.result().data.map(|p| p.items.clone()), Some(vec![1]));
    }

    #[test]
    fn least_recently_used_page_is_evicted() {
        let mut manager = QueryManager::<u32>::new(QueryOptions {
            max_entries: 2,
            ..QueryOptions::default()
        });
        let mut state = TableState::default();
        for index in 0..3 {
            state.pagination.page_index = index;
            let request = expect_fetch(manager.observe(&state));
            manager.resolve(request.id, Ok(page(vec![index as u32], 30)));
        }
        assert_eq!(manager.cached_len(), 2);

        // page 1 is still cached, page 0 was dropped
        state.pagination.page_index = 1;
        assert_eq!(manager.observe(&state), QueryDirective::Idle);
        state.pagination.page_index = 0;
        let request = expect_fetch(manager.observe(&state));
        assert_eq!(request.key.page_index, 0);
        assert_eq!(manager.cached_len(), 2);
        assert_eq!(manager.result().data.map(|p| p.items.clone()), Some(vec![1]));
    }

    #[test]
    fn in_flight_and_current_pages_survive_eviction() {
        let mut manager = QueryManager::<u32>::new(QueryOptions {
            max_entries: 1,
            ..QueryOptions::default()
        });
        let mut state = TableState::default();
        let first = expect_fetch(manager.observe(&state));
        state.pagination.page_index = 1;
        let second = expect_fetch(manager.observe(&state));
        assert_eq!(manager.cached_len(), 2);

        assert!(!manager.resolve(first.id, Ok(page(vec![0], 20))));
        assert!(manager.resolve(second.id, Ok(page(vec![1], 20))));
        state.pagination.page_index = 2;
        let third = expect_fetch(manager.observe(&state));
        assert_eq!(manager.cached_len(), 1);
        assert!(manager.resolve(third.id, Ok(page(vec![2], 20))));
        assert_eq!(manager.result().data.map(|p| p.items.clone()), Some(vec![2]));
    }

    #[test]
    fn invalidate_keeps_placeholder_and_refetches() {
        let mut manager = QueryManager::<u32>::default();
        let state = TableState::default();
        let a = expect_fetch(manager.observe(&state));
        manager.resolve(a.id, Ok(page(vec![1], 1)));
        manager.invalidate();
        assert!(manager.result().is_stale);
        expect_fetch(manager.observe(&state));
    }
}
