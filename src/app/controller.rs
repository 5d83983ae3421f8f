//! One mounted table: store, URL binding, query cache and history.
//!
//! [`TableController`] wires the layers together. Every state change goes
//! through [`TableController::settle`], which applies the page-reset rule,
//! collects the fetch (if any) and stages the URL write.
//!
//! Fetches caused by a search or filter change wait out the same debounce
//! window as URL writes and are issued by a later tick. Paging, sorting and
//! navigation fetch right away.

use super::Action;
use crate::domain::{TableState, TableSyncError};
use crate::notify::ToastOptions;
use crate::query::{FetchOutcome, QueryDirective, QueryManager, QueryResult};
use crate::store::TableStateStore;
use crate::sync::{History, UrlSync, WriteScheduler};
use crate::Config;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

pub struct TableController<H, T> {
    columns: BTreeSet<String>,
    store: TableStateStore,
    sync: UrlSync,
    query: QueryManager<T>,
    pending_fetch: WriteScheduler<()>,
    history: H,
}

impl<H: History, T> TableController<H, T> {
    /// Mounts a table on `history`.
    ///
    /// The store is seeded from `initial`, then from the current location.
    /// The URL wins for pagination and sorting, and for search and filters
    /// when server-side filtering is on.
    pub fn mount(config: &Config, history: H, initial: TableState) -> Self {
        let sync = UrlSync::new(
            config.column_ids.iter().cloned(),
            config.url_keys(),
            config.sync_options(),
        );
        Self::with_parts(
            config.column_ids.iter().cloned(),
            sync,
            QueryManager::new(config.query_options()),
            history,
            initial,
        )
    }

    /// Mounts a table from pre-built layers.
    pub fn with_parts<I, S>(
        columns: I,
        mut sync: UrlSync,
        query: QueryManager<T>,
        history: H,
        initial: TableState,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _span = tracing::debug_span!("mount", location = %history.location()).entered();

        let mut state = initial;
        let server_filtering = sync.options().server_filtering;
        sync.observe_location(history.location()).apply_to(&mut state, server_filtering);
        tracing::debug!(
            page_index = state.pagination.page_index,
            page_size = state.pagination.page_size,
            sort_keys = state.sorting.len(),
            filters = state.column_filters.len(),
            "table mounted"
        );

        let pending_fetch = WriteScheduler::new(sync.options().debounce, sync.options().throttle);
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            store: TableStateStore::new(state),
            sync,
            query,
            pending_fetch,
            history,
        }
    }

    /// Actions for the initial render.
    pub fn start(&mut self, now: Instant) -> Vec<Action> {
        self.settle(now)
    }

    #[must_use]
    pub fn state(&self) -> Arc<TableState> {
        self.store.state()
    }

    #[must_use]
    pub const fn store(&self) -> &TableStateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TableStateStore {
        &mut self.store
    }

    #[must_use]
    pub const fn sync(&self) -> &UrlSync {
        &self.sync
    }

    #[must_use]
    pub const fn query(&self) -> &QueryManager<T> {
        &self.query
    }

    #[must_use]
    pub fn result(&self) -> QueryResult<T> {
        self.query.result()
    }

    #[must_use]
    pub const fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Next time [`TableEvent::Tick`](super::TableEvent::Tick) has work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.sync.next_deadline(), self.pending_fetch.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Whether a debounced fetch is waiting for its deadline.
    #[must_use]
    pub fn fetch_pending(&self) -> bool {
        self.pending_fetch.pending().is_some()
    }

    pub(crate) fn check_column(&self, column_id: &str) -> crate::Result<()> {
        if self.columns.is_empty() || self.columns.contains(column_id) {
            Ok(())
        } else {
            Err(TableSyncError::Validation(format!("unknown column `{column_id}`")))
        }
    }

    /// Applies the page-reset rule, collects the fetch for the resulting
    /// state and stages the URL write.
    pub(crate) fn settle(&mut self, now: Instant) -> Vec<Action> {
        if self.query.filters_changed(self.store.snapshot()) {
            if self.store.snapshot().pagination.page_index != 0 {
                tracing::debug!("filters changed off the first page, resetting");
                self.store.update_pagination(|p| p.page_index = 0);
            }
            self.query.rebase(self.store.snapshot());
            self.pending_fetch.schedule((), now);
            self.sync.stage(self.store.snapshot(), now);
            return Vec::new();
        }

        self.pending_fetch.cancel();
        let actions = self.fetch_current();
        self.sync.stage(self.store.snapshot(), now);
        actions
    }

    /// Issues the debounced fetch if it is due.
    pub(crate) fn poll_fetch(&mut self, now: Instant) -> Vec<Action> {
        if self.pending_fetch.poll(now).is_none() {
            return Vec::new();
        }
        tracing::debug!("debounced fetch due");
        self.fetch_current()
    }

    fn fetch_current(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        loop {
            match self.query.observe(self.store.snapshot()) {
                QueryDirective::ResetPage => {
                    self.store.update_pagination(|p| p.page_index = 0);
                }
                QueryDirective::Fetch(request) => {
                    actions.push(Action::Fetch(request));
                    break;
                }
                QueryDirective::Idle => break,
            }
        }
        self.store.set_page_count(self.query.page_count());
        actions
    }

    /// Reads `url` into the store after navigation. The URL's filters become
    /// the baseline, so its page is kept and nothing is written back.
    pub(crate) fn follow_location(&mut self, url: &Url, now: Instant) -> Vec<Action> {
        let server_filtering = self.sync.options().server_filtering;
        let slice = self.sync.observe_location(url);
        let mut state = (*self.store.state()).clone();
        slice.apply_to(&mut state, server_filtering);
        self.store.set_state(state);
        self.query.rebase(self.store.snapshot());
        self.settle(now)
    }

    /// Records a fetch outcome. Returns whether the visible result changed
    /// and any notification to show.
    pub(crate) fn complete(&mut self, outcome: FetchOutcome<T>) -> (bool, Option<Action>) {
        let failure = outcome.result.as_ref().err().cloned();
        let visible = self.query.apply(outcome);
        if !visible {
            return (false, None);
        }
        self.store.set_page_count(self.query.page_count());
        let notice = failure.map(|error| {
            Action::Notify(
                ToastOptions::new("Failed to load data")
                    .description(error.to_string())
                    .destructive(),
            )
        });
        (true, notice)
    }

    pub(crate) fn refetch(&mut self) -> Option<Action> {
        if self.pending_fetch.cancel().is_some() {
            if let Some(action) = self.fetch_current().pop() {
                return Some(action);
            }
        }
        self.query.refetch(self.store.snapshot()).map(Action::Fetch)
    }

    /// Writes the pending URL change if it is due.
    pub fn poll_url(&mut self, now: Instant) -> Option<Url> {
        self.sync.poll(now, &mut self.history)
    }

    /// Writes the pending URL change now, e.g. before unmounting.
    pub fn flush_url(&mut self, now: Instant) -> Option<Url> {
        self.sync.flush(now, &mut self.history)
    }
}
