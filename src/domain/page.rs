//! Page of rows returned by a fetch function.

use serde::{Deserialize, Serialize};

/// One page of server results.
///
/// Field names follow the wire contract of the fetch function
/// (`items`, `totalCount`, `lastPage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub last_page: usize,
}

impl<T> Page<T> {
    /// An empty single page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            last_page: 1,
        }
    }

    /// Maps the rows, keeping the counts.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            last_page: self.last_page,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
