//! Side effects requested by the event handler.
//!
//! The controller never performs I/O itself. After each event it returns a
//! list of [`Action`]s that the runtime carries out: fetches go to a
//! [`Fetcher`](crate::query::Fetcher) (or the worker bridge), and
//! notifications go to a [`ToastStore`](crate::notify::ToastStore).
//!
//! # Example
//!
//! ```
//! use tablesync::app::Action;
//! use tablesync::notify::ToastOptions;
//!
//! let action = Action::Notify(ToastOptions::new("Saved"));
//! assert!(matches!(action, Action::Notify(_)));
//! ```

use crate::notify::ToastOptions;
use crate::query::FetchRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run this request and feed the outcome back as
    /// [`TableEvent::FetchCompleted`](super::TableEvent::FetchCompleted).
    Fetch(FetchRequest),

    /// Show a toast.
    Notify(ToastOptions),
}
