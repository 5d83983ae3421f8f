//! Bidirectional binding between table state and URL query parameters.
//!
//! The bound slice is pagination (`page`, one-based, and `perPage`) and
//! sorting (`sort`); with server-side filtering enabled it also covers the
//! global filter (`search`) and the column filters (`filter`, stored as the
//! JSON filter array so it decodes back losslessly).
//!
//! Reads happen once on mount and again on back/forward navigation. Writes
//! are staged on every state change and leave through a [`WriteScheduler`],
//! so a burst of keystrokes becomes a single history write. Parameters that
//! do not belong to the table are preserved untouched.

use super::history::{History, HistoryMode};
use super::scheduler::WriteScheduler;
use crate::codec::{decode_or_default, Codec, FiltersCodec, IntegerCodec, PageCodec, SortingCodec, StringCodec};
use crate::domain::{ColumnFiltersState, PaginationState, SortingState, TableState, DEFAULT_PAGE_SIZE};
use std::time::{Duration, Instant};
use url::Url;

/// Query-parameter names used by the sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlKeys {
    pub page: String,
    pub per_page: String,
    pub sort: String,
    pub search: String,
    pub filter: String,
}

impl Default for UrlKeys {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            per_page: "perPage".to_string(),
            sort: "sort".to_string(),
            search: "search".to_string(),
            filter: "filter".to_string(),
        }
    }
}

impl UrlKeys {
    fn all(&self) -> [&str; 5] {
        [
            self.page.as_str(),
            self.per_page.as_str(),
            self.sort.as_str(),
            self.search.as_str(),
            self.filter.as_str(),
        ]
    }
}

/// Write policy for the sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Quiet period before a staged change is written.
    pub debounce: Duration,
    /// Minimum interval between two writes.
    pub throttle: Duration,
    /// Whether writes replace the current entry or push a new one.
    pub history: HistoryMode,
    /// Omit parameters equal to their default.
    pub clear_on_default: bool,
    /// Also bind `search` and `filter`.
    pub server_filtering: bool,
    /// Page size assumed when the URL has none.
    pub default_page_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            throttle: Duration::from_millis(50),
            history: HistoryMode::Replace,
            clear_on_default: true,
            server_filtering: false,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The part of [`TableState`] that lives in the URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlState {
    pub pagination: PaginationState,
    pub sorting: SortingState,
    pub global_filter: String,
    pub column_filters: ColumnFiltersState,
}

impl UrlState {
    /// Extracts the URL-bound slice of `state`.
    #[must_use]
    pub fn from_table(state: &TableState, server_filtering: bool) -> Self {
        Self {
            pagination: state.pagination,
            sorting: state.sorting.clone(),
            global_filter: if server_filtering { state.global_filter.clone() } else { String::new() },
            column_filters: if server_filtering { state.column_filters.clone() } else { Vec::new() },
        }
    }

    /// Copies this slice onto `state`. Search and filters are only applied
    /// when `server_filtering` is set.
    pub fn apply_to(&self, state: &mut TableState, server_filtering: bool) {
        state.pagination = self.pagination;
        state.sorting.clone_from(&self.sorting);
        if server_filtering {
            state.global_filter.clone_from(&self.global_filter);
            state.column_filters.clone_from(&self.column_filters);
        }
    }
}

/// URL sync layer for one table.
#[derive(Debug, Clone)]
pub struct UrlSync {
    keys: UrlKeys,
    options: SyncOptions,
    sorting: SortingCodec,
    filters: FiltersCodec,
    /// Slice most recently read from or written to the URL.
    committed: UrlState,
    scheduler: WriteScheduler<UrlState>,
}

impl UrlSync {
    /// Creates a sync layer validating sort and filter columns against
    /// `columns`.
    pub fn new<I, S>(columns: I, keys: UrlKeys, options: SyncOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let scheduler = WriteScheduler::new(options.debounce, options.throttle);
        let committed = Self::defaults_for(&options);
        Self {
            sorting: SortingCodec::new(columns.iter().cloned()),
            filters: FiltersCodec::new(columns),
            keys,
            options,
            committed,
            scheduler,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    #[must_use]
    pub const fn keys(&self) -> &UrlKeys {
        &self.keys
    }

    fn defaults_for(options: &SyncOptions) -> UrlState {
        UrlState {
            pagination: PaginationState::new(0, options.default_page_size),
            sorting: Vec::new(),
            global_filter: String::new(),
            column_filters: Vec::new(),
        }
    }

    /// Slice used for anything the URL does not specify.
    #[must_use]
    pub fn defaults(&self) -> UrlState {
        Self::defaults_for(&self.options)
    }

    /// Decodes the bound slice from `url`, field by field. A field that is
    /// missing or invalid takes its default without affecting the others.
    #[must_use]
    pub fn read(&self, url: &Url) -> UrlState {
        let _span = tracing::debug_span!("url_read", url = %url).entered();
        let param = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        };
        let defaults = self.defaults();

        let page_index = decode_or_default(&PageCodec, param(&self.keys.page).as_deref(), 0);
        let page_size = decode_or_default(
            &IntegerCodec,
            param(&self.keys.per_page).as_deref(),
            defaults.pagination.page_size,
        );
        let sorting = decode_or_default(&self.sorting, param(&self.keys.sort).as_deref(), Vec::new());

        let (global_filter, column_filters) = if self.options.server_filtering {
            (
                decode_or_default(&StringCodec, param(&self.keys.search).as_deref(), String::new()),
                decode_or_default(&self.filters, param(&self.keys.filter).as_deref(), Vec::new()),
            )
        } else {
            (String::new(), Vec::new())
        };

        UrlState {
            pagination: PaginationState::new(page_index, page_size),
            sorting,
            global_filter,
            column_filters,
        }
    }

    /// Reads `url` as the new baseline, e.g. after back/forward navigation.
    /// Any pending write is dropped.
    pub fn observe_location(&mut self, url: &Url) -> UrlState {
        if self.scheduler.cancel().is_some() {
            tracing::debug!("pending url write dropped by navigation");
        }
        let state = self.read(url);
        self.committed = state.clone();
        state
    }

    fn same(&self, a: &UrlState, b: &UrlState) -> bool {
        a.pagination == b.pagination
            && self.sorting.eq(&a.sorting, &b.sorting)
            && StringCodec.eq(&a.global_filter, &b.global_filter)
            && self.filters.eq(&a.column_filters, &b.column_filters)
    }

    /// Stages the URL slice of `state` for writing. Returns `true` if a write
    /// is now pending.
    pub fn stage(&mut self, state: &TableState, now: Instant) -> bool {
        let next = UrlState::from_table(state, self.options.server_filtering);
        let target = self.scheduler.pending().unwrap_or(&self.committed);
        if self.same(&next, target) {
            return self.scheduler.pending().is_some();
        }
        if self.same(&next, &self.committed) {
            tracing::debug!("state returned to url value, pending write dropped");
            self.scheduler.cancel();
            return false;
        }
        self.scheduler.schedule(next, now);
        true
    }

    /// When the pending write becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Writes the pending slice if it is due. Returns the written URL.
    pub fn poll<H: History + ?Sized>(&mut self, now: Instant, history: &mut H) -> Option<Url> {
        let state = self.scheduler.poll(now)?;
        Some(self.commit(state, history))
    }

    /// Writes the pending slice immediately.
    pub fn flush<H: History + ?Sized>(&mut self, now: Instant, history: &mut H) -> Option<Url> {
        let state = self.scheduler.take(now)?;
        Some(self.commit(state, history))
    }

    fn commit<H: History + ?Sized>(&mut self, state: UrlState, history: &mut H) -> Url {
        let url = self.write_into(history.location(), &state);
        tracing::debug!(url = %url, mode = ?self.options.history, "writing table state to url");
        history.write(url.clone(), self.options.history);
        self.committed = state;
        url
    }

    /// Returns `base` with the bound parameters replaced by `state`.
    ///
    /// Foreign parameters keep their order and come first; bound parameters
    /// follow in a fixed order (`page`, `perPage`, `sort`, `search`,
    /// `filter`), so the same state always yields the same URL.
    #[must_use]
    pub fn write_into(&self, base: &Url, state: &UrlState) -> Url {
        let owned = self.keys.all();
        let mut pairs: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(k, _)| !owned.contains(&&**k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.extend(self.encode(state));

        let mut url = base.clone();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url
    }

    /// Encodes the bound parameters for `state`, honouring `clear_on_default`.
    #[must_use]
    pub fn encode(&self, state: &UrlState) -> Vec<(String, String)> {
        let defaults = self.defaults();
        let keep_defaults = !self.options.clear_on_default;
        let mut out = Vec::with_capacity(5);

        if keep_defaults || state.pagination.page_index != defaults.pagination.page_index {
            out.push((self.keys.page.clone(), PageCodec.encode(&state.pagination.page_index)));
        }
        if keep_defaults || state.pagination.page_size != defaults.pagination.page_size {
            out.push((self.keys.per_page.clone(), IntegerCodec.encode(&state.pagination.page_size)));
        }
        if keep_defaults || !state.sorting.is_empty() {
            out.push((self.keys.sort.clone(), self.sorting.encode(&state.sorting)));
        }
        if self.options.server_filtering {
            if keep_defaults || !state.global_filter.is_empty() {
                out.push((self.keys.search.clone(), StringCodec.encode(&state.global_filter)));
            }
            if keep_defaults || !state.column_filters.is_empty() {
                out.push((self.keys.filter.clone(), self.filters.encode(&state.column_filters)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnFilter, ColumnSort, FilterValue};
    use crate::sync::MemoryHistory;

    fn sync(options: SyncOptions) -> UrlSync {
        UrlSync::new(["name", "email", "status"], UrlKeys::default(), options)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn reads_page_size_and_sort() {
        let s = sync(SyncOptions::default());
        let state = s.read(&url(
            r#"https://app.test/users?page=2&perPage=10&sort=[{"id":"name","desc":true}]"#,
        ));
        assert_eq!(state.pagination, PaginationState::new(1, 10));
        assert_eq!(state.sorting, vec![ColumnSort::desc("name")]);
    }

    #[test]
    fn invalid_fields_degrade_independently() {
        let s = sync(SyncOptions::default());
        let state = s.read(&url(
            r#"https://app.test/?page=0&perPage=25&sort=[{"id":"ghost","desc":true}]"#,
        ));
        assert_eq!(state.pagination, PaginationState::new(0, 25));
        assert!(state.sorting.is_empty());
    }

    #[test]
    fn filters_ignored_without_server_filtering() {
        let s = sync(SyncOptions::default());
        let state = s.read(&url("https://app.test/?search=ann"));
        assert!(state.global_filter.is_empty());
    }

    #[test]
    fn clear_on_default_omits_defaults() {
        let s = sync(SyncOptions::default());
        let written = s.write_into(&url("https://app.test/users?tab=all"), &s.defaults());
        assert_eq!(written.as_str(), "https://app.test/users?tab=all");

        let explicit = sync(SyncOptions {
            clear_on_default: false,
            ..SyncOptions::default()
        });
        let written = explicit.write_into(&url("https://app.test/users"), &explicit.defaults());
        assert_eq!(written.as_str(), "https://app.test/users?page=1&perPage=10&sort=%5B%5D");
    }

    #[test]
    fn write_then_read_round_trips() {
        let s = sync(SyncOptions {
            server_filtering: true,
            ..SyncOptions::default()
        });
        let state = UrlState {
            pagination: PaginationState::new(3, 20),
            sorting: vec![ColumnSort::asc("email"), ColumnSort::desc("name")],
            global_filter: "ann & bob".to_string(),
            column_filters: vec![ColumnFilter::new("status", FilterValue::Select("active".into()))],
        };
        let written = s.write_into(&url("https://app.test/users?tab=all&page=9"), &state);
        assert!(written.as_str().starts_with("https://app.test/users?tab=all&page=4&perPage=20"));
        assert_eq!(s.read(&written), state);
    }

    #[test]
    fn staged_burst_writes_once() {
        let mut s = sync(SyncOptions::default());
        let mut history = MemoryHistory::new(url("https://app.test/users"));
        let t0 = Instant::now();
        let mut table = TableState::default();
        for (i, offset) in [0u64, 20, 40].into_iter().enumerate() {
            table.pagination.page_index = i + 1;
            s.stage(&table, t0 + Duration::from_millis(offset));
            assert!(s.poll(t0 + Duration::from_millis(offset), &mut history).is_none());
        }
        let written = s.poll(t0 + Duration::from_millis(340), &mut history);
        assert_eq!(written.map(String::from).as_deref(), Some("https://app.test/users?page=4"));
        assert_eq!(history.write_count(), 1);
    }

    #[test]
    fn reverting_before_deadline_cancels_write() {
        let mut s = sync(SyncOptions::default());
        let mut history = MemoryHistory::new(url("https://app.test/users"));
        let t0 = Instant::now();
        let mut table = TableState::default();
        table.pagination.page_index = 2;
        assert!(s.stage(&table, t0));
        table.pagination.page_index = 0;
        assert!(!s.stage(&table, t0 + Duration::from_millis(10)));
        assert!(s.poll(t0 + Duration::from_secs(1), &mut history).is_none());
        assert_eq!(history.write_count(), 0);
    }

    #[test]
    fn push_mode_adds_entries() {
        let mut s = sync(SyncOptions {
            history: HistoryMode::Push,
            debounce: Duration::ZERO,
            ..SyncOptions::default()
        });
        let mut history = MemoryHistory::new(url("https://app.test/users"));
        let t0 = Instant::now();
        let mut table = TableState::default();
        table.pagination.page_index = 1;
        s.stage(&table, t0);
        s.poll(t0, &mut history);
        assert_eq!(history.len(), 2);
    }
}
