//! URL sync layer.
//!
//! Binds the pagination, sorting and (optionally) filter slice of a table to
//! URL query parameters, with debounced and throttled writes through a
//! pluggable history backend.
//!
//! - [`history`]: the [`History`] trait and the in-memory [`MemoryHistory`]
//! - [`scheduler`]: trailing-edge debounce with a minimum write interval
//! - [`url_sync`]: reading, staging and writing the bound slice
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use tablesync::domain::TableState;
//! use tablesync::sync::{History, MemoryHistory, SyncOptions, UrlKeys, UrlSync};
//!
//! let mut history = MemoryHistory::parse("https://app.test/users").unwrap();
//! let mut sync = UrlSync::new(["name"], UrlKeys::default(), SyncOptions::default());
//!
//! let mut state = TableState::default();
//! state.pagination.page_index = 1;
//! let now = Instant::now();
//! sync.stage(&state, now);
//! sync.poll(now + Duration::from_millis(300), &mut history);
//! assert_eq!(history.location().as_str(), "https://app.test/users?page=2");
//! ```

pub mod history;
pub mod scheduler;
pub mod url_sync;

pub use history::{History, HistoryMode, MemoryHistory};
pub use scheduler::WriteScheduler;
pub use url_sync::{SyncOptions, UrlKeys, UrlState, UrlSync};
