//! Sorting codec.
//!
//! Wire form is a JSON array of `{"id": <column>, "desc": <bool>}` objects,
//! primary sort first:
//!
//! ```text
//! [{"id":"name","desc":true},{"id":"createdAt","desc":false}]
//! ```
//!
//! Decoding is all-or-nothing. A single entry with an unknown column, a
//! non-boolean `desc` or a repeated column invalidates the whole array, since
//! applying the valid remainder would produce an ordering the user never
//! asked for.

use super::Codec;
use crate::domain::{ColumnSort, SortingState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize, Deserialize)]
struct SortEntry<'a> {
    id: std::borrow::Cow<'a, str>,
    desc: bool,
}

/// Codec for [`SortingState`], validating column ids.
#[derive(Debug, Clone, Default)]
pub struct SortingCodec {
    known_columns: BTreeSet<String>,
}

impl SortingCodec {
    /// Creates a codec accepting only the given column ids.
    pub fn new<I, S>(known_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_columns: known_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Column ids this codec accepts.
    #[must_use]
    pub const fn known_columns(&self) -> &BTreeSet<String> {
        &self.known_columns
    }
}

impl Codec for SortingCodec {
    type Value = SortingState;

    fn encode(&self, sorting: &SortingState) -> String {
        let entries: Vec<SortEntry<'_>> = sorting
            .iter()
            .map(|s| SortEntry {
                id: s.column_id.as_str().into(),
                desc: s.descending,
            })
            .collect();
        // Serializing strings and bools into JSON cannot fail.
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    fn decode(&self, raw: &str) -> Option<SortingState> {
        let entries: Vec<SortEntry<'_>> = match serde_json::from_str(raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(error = %e, "sorting is not a valid {{id, desc}} array");
                return None;
            }
        };

        let mut seen = BTreeSet::new();
        let mut sorting = Vec::with_capacity(entries.len());
        for entry in entries {
            if !self.known_columns.contains(entry.id.as_ref()) {
                tracing::debug!(column = %entry.id, "sorting names unknown column");
                return None;
            }
            if !seen.insert(entry.id.to_string()) {
                tracing::debug!(column = %entry.id, "sorting repeats column");
                return None;
            }
            sorting.push(ColumnSort {
                column_id: entry.id.into_owned(),
                descending: entry.desc,
            });
        }
        Some(sorting)
    }
}
