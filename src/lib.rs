//! tablesync: data-table state that stays in sync with the URL and the server.
//!
//! The crate owns the state behind a server-driven data table (pagination,
//! sorting, column filters, global search, column visibility and row
//! selection) and keeps it consistent with two external parties:
//!
//! - the **URL**, so a table view can be bookmarked, shared and navigated with
//!   back/forward; writes are debounced and throttled;
//! - the **server**, through a cached, supersession-aware query layer that
//!   turns state into deterministic request parameters.
//!
//! Alongside it sit an OKLCH ⇄ hex color converter with a theme editor, and a
//! small toast notification store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - TableEvent → (render?, Vec<Action>)              │
//! │  - TableController: store + URL sync + queries      │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ store/        │   │ sync/         │   │ query/        │
//! │ - set_/update_│   │ - History     │   │ - params      │
//! │ - helpers     │   │ - debounce    │   │ - cache/keys  │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ codec/        │   │ source/       │   │ worker/       │
//! │ - URL values  │   │ - PageSource  │   │ - JSON bridge │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  domain/  color/  theme/  notify/  infrastructure/  │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - tracing → OpenTelemetry → OTLP/JSON file         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! [`Config`] comes either from a flat string map (command-line `key=value`
//! pairs) or from a TOML file:
//!
//! ```toml
//! namespace = "users"
//! column_ids = ["name", "email", "status"]
//! page_size = 20
//! debounce_ms = 300
//! history = "push"
//! server_filtering = true
//! theme_name = "slate"
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use tablesync::app::{handle_event, Action, TableController, TableEvent};
//! use tablesync::sync::MemoryHistory;
//! use tablesync::Config;
//!
//! let config = Config::default();
//! let history = MemoryHistory::parse("https://app.test/users?page=2")?;
//! let mut table: TableController<_, serde_json::Value> =
//!     TableController::mount(&config, history, config.initial_state());
//!
//! let now = Instant::now();
//! let actions = table.start(now);
//! assert!(matches!(actions.as_slice(), [Action::Fetch(_)]));
//!
//! // Search fetches wait for the debounce window and come out of a tick.
//! let (render, actions) = handle_event(&mut table, TableEvent::SetGlobalFilter("ann".into()), now)?;
//! assert!(render && actions.is_empty());
//! let due = table.next_deadline().expect("fetch scheduled");
//! let (_, actions) = handle_event(&mut table, TableEvent::Tick, due)?;
//! assert!(matches!(actions.as_slice(), [Action::Fetch(_)]));
//! # Ok::<(), tablesync::TableSyncError>(())
//! ```

#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod codec;
pub mod color;
pub mod domain;
pub mod infrastructure;
pub mod notify;
pub mod observability;
pub mod query;
pub mod source;
pub mod store;
pub mod sync;
pub mod theme;
pub mod worker;

pub use app::{handle_event, Action, TableController, TableEvent};
pub use color::{hex_to_oklch, oklch_to_hex, Oklch, Rgb};
pub use domain::{FetchError, Result, TableState, TableSyncError};
pub use theme::Theme;

use domain::{PaginationState, DEFAULT_PAGE_SIZE};
use notify::{ToastStore, DEFAULT_REMOVE_DELAY, DEFAULT_TOAST_LIMIT};
use query::QueryOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use sync::{HistoryMode, SyncOptions, UrlKeys};

/// Table configuration.
///
/// Every field has a default, so both [`Config::from_map`] and
/// [`Config::from_file`] accept partial input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache namespace, usually the resource name. Default: `"table"`
    pub namespace: String,

    /// Known column ids. When non-empty, sort and filter entries for other
    /// columns are dropped from the URL and rejected by the controller.
    pub column_ids: Vec<String>,

    /// Initial page size. Default: 10
    pub page_size: usize,

    /// Quiet period before a URL write, in milliseconds. Default: 300
    pub debounce_ms: u64,

    /// Minimum interval between URL writes, in milliseconds. Default: 50
    pub throttle_ms: u64,

    /// `replace` (default) or `push`.
    pub history: HistoryMode,

    /// Omit URL parameters that equal their default. Default: true
    pub clear_on_default: bool,

    /// Bind the global filter and column filters to the URL. Default: false
    pub server_filtering: bool,

    pub page_key: String,
    pub per_page_key: String,
    pub sort_key: String,
    pub search_key: String,
    pub filter_key: String,

    /// Joins filter clauses in the request expression. Default: `" and "`
    pub conjunction: String,

    /// Query keys whose pages stay cached. Default: 50
    pub query_cache_entries: usize,

    /// `trace`, `debug`, `info`, `warn` or `error`. `RUST_LOG` overrides it.
    pub trace_level: Option<String>,

    /// Rotation threshold of the trace file in bytes. Default: 10 MiB
    pub trace_max_bytes: u64,

    /// Rotated trace files to keep. Default: 3
    pub trace_backups: usize,

    /// Built-in theme (`neutral` or `slate`). Ignored if `theme_file` is set.
    pub theme_name: Option<String>,

    /// Path to a TOML theme file.
    pub theme_file: Option<String>,

    /// Toasts shown at once. Default: 1
    pub toast_limit: usize,

    /// Delay between dismissing a toast and removing it, in milliseconds.
    pub toast_remove_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let keys = UrlKeys::default();
        let sync = SyncOptions::default();
        Self {
            namespace: "table".to_string(),
            column_ids: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: duration_ms(sync.debounce),
            throttle_ms: duration_ms(sync.throttle),
            history: sync.history,
            clear_on_default: sync.clear_on_default,
            server_filtering: sync.server_filtering,
            page_key: keys.page,
            per_page_key: keys.per_page,
            sort_key: keys.sort,
            search_key: keys.search,
            filter_key: keys.filter,
            conjunction: " and ".to_string(),
            query_cache_entries: QueryOptions::default().max_entries,
            trace_level: None,
            trace_max_bytes: observability::DEFAULT_MAX_BYTES,
            trace_backups: observability::DEFAULT_MAX_BACKUPS,
            theme_name: None,
            theme_file: None,
            toast_limit: DEFAULT_TOAST_LIMIT,
            toast_remove_delay_ms: duration_ms(DEFAULT_REMOVE_DELAY),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Parses configuration from a flat string map.
    ///
    /// Unknown keys are ignored. A value that fails to parse falls back to
    /// that field's default and is logged; it never fails the whole config.
    ///
    /// # Parsing Rules
    ///
    /// - `column_ids`: comma-separated list (empty entries dropped)
    /// - numbers and booleans: standard Rust parsing
    /// - `history`: `replace` or `push`, case-insensitive
    /// - `theme` is accepted as an alias for `theme_name`
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use tablesync::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("column_ids".to_string(), "name, email,".to_string());
    /// map.insert("page_size".to_string(), "25".to_string());
    /// map.insert("debounce_ms".to_string(), "soon".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.column_ids, vec!["name", "email"]);
    /// assert_eq!(config.page_size, 25);
    /// assert_eq!(config.debounce_ms, 300);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let column_ids = map
            .get("column_ids")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.column_ids);

        let history = match map.get("history") {
            Some(raw) => HistoryMode::parse(raw).unwrap_or_else(|| {
                tracing::warn!(key = "history", value = %raw, "invalid config value, using default");
                defaults.history
            }),
            None => defaults.history,
        };

        let text = |key: &str, fallback: String| map.get(key).cloned().unwrap_or(fallback);

        Self {
            namespace: text("namespace", defaults.namespace),
            column_ids,
            page_size: parse_field(map, "page_size", defaults.page_size).max(1),
            debounce_ms: parse_field(map, "debounce_ms", defaults.debounce_ms),
            throttle_ms: parse_field(map, "throttle_ms", defaults.throttle_ms),
            history,
            clear_on_default: parse_field(map, "clear_on_default", defaults.clear_on_default),
            server_filtering: parse_field(map, "server_filtering", defaults.server_filtering),
            page_key: text("page_key", defaults.page_key),
            per_page_key: text("per_page_key", defaults.per_page_key),
            sort_key: text("sort_key", defaults.sort_key),
            search_key: text("search_key", defaults.search_key),
            filter_key: text("filter_key", defaults.filter_key),
            conjunction: text("conjunction", defaults.conjunction),
            query_cache_entries: parse_field(map, "query_cache_entries", defaults.query_cache_entries)
                .max(1),
            trace_level: map.get("trace_level").cloned(),
            trace_max_bytes: parse_field(map, "trace_max_bytes", defaults.trace_max_bytes),
            trace_backups: parse_field(map, "trace_backups", defaults.trace_backups),
            theme_name: map.get("theme_name").or_else(|| map.get("theme")).cloned(),
            theme_file: map.get("theme_file").cloned(),
            toast_limit: parse_field(map, "toast_limit", defaults.toast_limit),
            toast_remove_delay_ms: parse_field(
                map,
                "toast_remove_delay_ms",
                defaults.toast_remove_delay_ms,
            ),
        }
    }

    /// Loads configuration from a TOML file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`Config::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints the types alone do not express.
    ///
    /// # Errors
    ///
    /// Returns [`TableSyncError::Config`] for a zero page size or cache
    /// size, blank parameter names or duplicate parameter names.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(TableSyncError::Config("page_size must be positive".to_string()));
        }
        if self.query_cache_entries == 0 {
            return Err(TableSyncError::Config("query_cache_entries must be positive".to_string()));
        }
        let keys = [
            &self.page_key,
            &self.per_page_key,
            &self.sort_key,
            &self.search_key,
            &self.filter_key,
        ];
        for (i, key) in keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(TableSyncError::Config("parameter names must not be blank".to_string()));
            }
            if keys[..i].contains(key) {
                return Err(TableSyncError::Config(format!("parameter name `{key}` used twice")));
            }
        }
        Ok(())
    }

    /// Table state before the URL is read: first page at `page_size`.
    #[must_use]
    pub fn initial_state(&self) -> TableState {
        TableState {
            pagination: PaginationState::new(0, self.page_size),
            ..TableState::default()
        }
    }

    #[must_use]
    pub fn url_keys(&self) -> UrlKeys {
        UrlKeys {
            page: self.page_key.clone(),
            per_page: self.per_page_key.clone(),
            sort: self.sort_key.clone(),
            search: self.search_key.clone(),
            filter: self.filter_key.clone(),
        }
    }

    #[must_use]
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            throttle: Duration::from_millis(self.throttle_ms),
            history: self.history,
            clear_on_default: self.clear_on_default,
            server_filtering: self.server_filtering,
            default_page_size: self.page_size,
        }
    }

    #[must_use]
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            namespace: self.namespace.clone(),
            page_key: self.page_key.clone(),
            per_page_key: self.per_page_key.clone(),
            sort_key: self.sort_key.clone(),
            search_key: self.search_key.clone(),
            filter_key: self.filter_key.clone(),
            conjunction: self.conjunction.clone(),
            max_entries: self.query_cache_entries,
        }
    }

    /// A toast store sized by `toast_limit` and `toast_remove_delay_ms`.
    #[must_use]
    pub fn toast_store(&self) -> ToastStore {
        ToastStore::new(
            self.toast_limit.max(1),
            Duration::from_millis(self.toast_remove_delay_ms),
        )
    }
}

fn parse_field<T: std::str::FromStr>(map: &BTreeMap<String, String>, key: &str, fallback: T) -> T {
    match map.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid config value, using default");
            fallback
        }),
        None => fallback,
    }
}

/// Resolves the configured theme.
///
/// `theme_file` wins over `theme_name`; anything that fails to load falls
/// back to the default theme with a debug log.
///
/// ```
/// use tablesync::{initialize, Config};
///
/// let config = Config {
///     theme_name: Some("slate".to_string()),
///     ..Config::default()
/// };
/// assert_eq!(initialize(&config).name, "slate");
/// ```
#[must_use]
pub fn initialize(config: &Config) -> Theme {
    tracing::debug!(namespace = %config.namespace, "initializing tablesync");

    if let Some(theme_file) = &config.theme_file {
        let path = infrastructure::expand_tilde(theme_file);
        return Theme::from_file(&path).unwrap_or_else(|e| {
            tracing::debug!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
            Theme::default()
        });
    }

    config.theme_name.as_ref().map_or_else(Theme::default, |theme_name| {
        Theme::from_name(theme_name).unwrap_or_else(|| {
            tracing::debug!(theme_name = %theme_name, "unknown theme, using default");
            Theme::default()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_component_defaults() {
        let config = Config::default();
        assert_eq!(config.sync_options(), SyncOptions::default());
        assert_eq!(config.url_keys(), UrlKeys::default());
        assert_eq!(config.query_options(), QueryOptions::default());
        assert_eq!(config.initial_state(), TableState::default());
    }

    #[test]
    fn map_parsing_falls_back_per_field() {
        let map: BTreeMap<String, String> = [
            ("history", "PUSH"),
            ("server_filtering", "true"),
            ("throttle_ms", "-5"),
            ("page_size", "0"),
            ("query_cache_entries", "8"),
            ("theme", "slate"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::from_map(&map);
        assert_eq!(config.history, HistoryMode::Push);
        assert!(config.server_filtering);
        assert_eq!(config.throttle_ms, 50);
        assert_eq!(config.page_size, 1);
        assert_eq!(config.query_options().max_entries, 8);
        assert_eq!(config.theme_name.as_deref(), Some("slate"));
    }

    #[test]
    fn toml_file_with_partial_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "namespace = \"users\"\ncolumn_ids = [\"name\", \"email\"]\nhistory = \"push\"\npage_key = \"p\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.namespace, "users");
        assert_eq!(config.column_ids, vec!["name", "email"]);
        assert_eq!(config.history, HistoryMode::Push);
        assert_eq!(config.url_keys().page, "p");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "page_key = \"sort\"").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(TableSyncError::Config(_))
        ));
    }

    #[test]
    fn missing_theme_file_falls_back() {
        let config = Config {
            theme_file: Some("/definitely/not/here.toml".to_string()),
            theme_name: Some("slate".to_string()),
            ..Config::default()
        };
        assert_eq!(initialize(&config), Theme::default());
    }
}
