//! History backends.
//!
//! The URL is a process-wide resource. The sync layer is the only writer for
//! its keys, and it writes through a [`History`] so the embedding environment
//! decides what "the URL" is. [`MemoryHistory`] keeps a stack of entries in
//! memory and counts writes, which is what tests and the CLI use.

use serde::{Deserialize, Serialize};
use url::Url;

/// How a URL write lands in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Overwrite the current entry.
    #[default]
    Replace,
    /// Add a new, back-button-navigable entry.
    Push,
}

impl HistoryMode {
    /// Parses `"replace"` or `"push"` (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "push" => Some(Self::Push),
            _ => None,
        }
    }
}

/// Browser-history-like navigation stack.
pub trait History {
    /// The current location.
    fn location(&self) -> &Url;

    /// Overwrites the current entry.
    fn replace(&mut self, url: Url);

    /// Appends a new entry after the current one, discarding forward entries.
    fn push(&mut self, url: Url);

    /// Moves back one entry. Returns the new location, or `None` at the start.
    fn back(&mut self) -> Option<&Url>;

    /// Moves forward one entry. Returns the new location, or `None` at the end.
    fn forward(&mut self) -> Option<&Url>;

    /// Writes `url` using `mode`.
    fn write(&mut self, url: Url, mode: HistoryMode) {
        match mode {
            HistoryMode::Replace => self.replace(url),
            HistoryMode::Push => self.push(url),
        }
    }
}

/// In-memory history stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Url>,
    index: usize,
    writes: usize,
}

impl MemoryHistory {
    /// Starts a history at `initial`.
    #[must_use]
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            writes: 0,
        }
    }

    /// Parses `initial` and starts a history there.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial` is not an absolute URL.
    pub fn parse(initial: &str) -> crate::Result<Self> {
        Ok(Self::new(Url::parse(initial)?))
    }

    /// Number of `replace`/`push` calls so far.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    /// Number of entries in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> &Url {
        &self.entries[self.index]
    }

    fn replace(&mut self, url: Url) {
        tracing::debug!(url = %url, "history replace");
        self.entries[self.index] = url;
        self.writes += 1;
    }

    fn push(&mut self, url: Url) {
        tracing::debug!(url = %url, "history push");
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index += 1;
        self.writes += 1;
    }

    fn back(&mut self) -> Option<&Url> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    fn forward(&mut self) -> Option<&Url> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }
}
