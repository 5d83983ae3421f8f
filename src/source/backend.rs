//! Page source abstraction.

use super::request::PageQuery;
use crate::domain::{Page, Result};
use serde_json::Value;

/// Serves pages of JSON rows.
///
/// # Implementations
///
/// - [`MemorySource`](super::MemorySource): rows held in memory
pub trait PageSource: Send {
    /// Returns the page described by `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn page(&self, query: &PageQuery) -> Result<Page<Value>>;

    /// Total number of rows before any filtering.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
