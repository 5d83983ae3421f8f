//! In-memory page source.
//!
//! Rows are JSON objects. A request is served in four steps: fuzzy global
//! search, filter clauses, stable multi-key sort, then slicing out the page.
//!
//! # Matching rules
//!
//! - `contains`, `startsWith`, `endsWith`: case-insensitive text match
//! - `eq`, `ne`, `lt`, `lte`, `gt`, `gte`, `between`: numeric when both sides
//!   parse as numbers, otherwise compared as text (ISO dates sort correctly)
//! - `before`, `after`: calendar dates, falling back to text
//! - `in`, `notIn`: comma-separated options; array fields match on any element
//!
//! A missing or `null` field fails every clause except `ne` and `notIn`.

use super::backend::PageSource;
use super::request::{Clause, PageQuery};
use crate::domain::{ColumnSort, FilterOperator, Page, Result, TableSyncError};
use chrono::NaiveDate;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Value>,
}

impl MemorySource {
    /// Creates a source over `rows`.
    #[must_use]
    pub const fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    /// Parses a JSON array of objects.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array of objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(rows) = value else {
            return Err(TableSyncError::Validation("rows must be a JSON array".to_string()));
        };
        if let Some(position) = rows.iter().position(|row| !row.is_object()) {
            return Err(TableSyncError::Validation(format!("row {position} is not an object")));
        }
        Ok(Self::new(rows))
    }

    /// Loads rows from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an array of
    /// objects.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = ?path, "loading rows");
        let contents = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&contents)?;
        tracing::debug!(rows = source.rows.len(), "rows loaded");
        Ok(source)
    }

    /// A small built-in user list.
    #[must_use]
    pub fn sample() -> Self {
        const NAMES: [&str; 12] = [
            "Ada Lovelace",
            "Alan Turing",
            "Anita Borg",
            "Barbara Liskov",
            "Dennis Ritchie",
            "Edsger Dijkstra",
            "Frances Allen",
            "Grace Hopper",
            "Hedy Lamarr",
            "Ken Thompson",
            "Margaret Hamilton",
            "Radia Perlman",
        ];
        const STATUSES: [&str; 3] = ["active", "inactive", "pending"];

        let rows = NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let login = name.to_lowercase().replace(' ', ".");
                json!({
                    "id": format!("u{}", i + 1),
                    "name": name,
                    "email": format!("{login}@example.com"),
                    "status": STATUSES[i % STATUSES.len()],
                    "age": 24 + (i * 7) % 40,
                    "joined": format!("2023-{:02}-{:02}", i % 12 + 1, (i * 3) % 28 + 1),
                })
            })
            .collect();
        Self::new(rows)
    }

    #[must_use]
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }
}

impl PageSource for MemorySource {
    fn page(&self, query: &PageQuery) -> Result<Page<Value>> {
        let _span = tracing::debug_span!(
            "memory_page",
            page = query.page,
            per_page = query.per_page,
            clauses = query.clauses.len(),
        )
        .entered();

        let tokens: Vec<String> = query
            .search
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();
        let matcher = (!tokens.is_empty()).then(SkimMatcherV2::default);

        let mut matched: Vec<&Value> = self
            .rows
            .iter()
            .filter(|row| {
                matcher
                    .as_ref()
                    .map_or(true, |m| matches_search(m, row, &tokens))
            })
            .filter(|row| query.clauses.iter().all(|clause| matches_clause(row, clause)))
            .collect();

        if !query.sort.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &query.sort));
        }

        let total = matched.len();
        let per_page = query.per_page.max(1);
        let last_page = ((total + per_page - 1) / per_page).max(1);
        let items: Vec<Value> = matched
            .into_iter()
            .skip(query.offset())
            .take(per_page)
            .cloned()
            .collect();

        tracing::debug!(total, last_page, returned = items.len(), "page served");
        Ok(Page {
            items,
            total_count: total as u64,
            last_page,
        })
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

fn field<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    row.as_object()
        .and_then(|object: &Map<String, Value>| object.get(column))
        .filter(|value| !value.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn matches_search(matcher: &SkimMatcherV2, row: &Value, tokens: &[String]) -> bool {
    let Some(object) = row.as_object() else {
        return false;
    };
    let haystacks: Vec<String> = object.values().filter_map(text).map(|s| s.to_lowercase()).collect();
    tokens
        .iter()
        .all(|token| haystacks.iter().any(|h| matcher.fuzzy_match(h, token).is_some()))
}

/// Compares two scalar strings numerically when both are numbers.
fn compare_scalars(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn compare_dates(left: &str, right: &str) -> Ordering {
    let date = |s: &str| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok();
    match (date(left), date(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}

fn matches_clause(row: &Value, clause: &Clause) -> bool {
    use FilterOperator as Op;

    let Some(value) = field(row, &clause.column) else {
        return matches!(clause.operator, Op::NotEquals | Op::IsNoneOf);
    };

    if let Value::Array(elements) = value {
        let options: Vec<&str> = clause.value.split(',').map(str::trim).collect();
        let any = elements
            .iter()
            .filter_map(text)
            .any(|e| options.contains(&e.as_str()));
        return match clause.operator {
            Op::IsAnyOf | Op::Equals | Op::Contains => any,
            Op::IsNoneOf | Op::NotEquals => !any,
            _ => false,
        };
    }

    let Some(actual) = text(value) else {
        return false;
    };
    let expected = clause.value.as_str();
    let lower = actual.to_lowercase();

    match clause.operator {
        Op::Contains => lower.contains(&expected.to_lowercase()),
        Op::StartsWith => lower.starts_with(&expected.to_lowercase()),
        Op::EndsWith => lower.ends_with(&expected.to_lowercase()),
        Op::Equals => compare_scalars(&actual, expected) == Ordering::Equal,
        Op::NotEquals => compare_scalars(&actual, expected) != Ordering::Equal,
        Op::LessThan => compare_scalars(&actual, expected) == Ordering::Less,
        Op::LessOrEqual => compare_scalars(&actual, expected) != Ordering::Greater,
        Op::GreaterThan => compare_scalars(&actual, expected) == Ordering::Greater,
        Op::GreaterOrEqual => compare_scalars(&actual, expected) != Ordering::Less,
        Op::IsBetween => expected.split_once(',').is_some_and(|(low, high)| {
            compare_scalars(&actual, low.trim()) != Ordering::Less
                && compare_scalars(&actual, high.trim()) != Ordering::Greater
        }),
        Op::IsBefore => compare_dates(&actual, expected) == Ordering::Less,
        Op::IsAfter => compare_dates(&actual, expected) == Ordering::Greater,
        Op::IsAnyOf => expected.split(',').any(|option| option.trim() == actual),
        Op::IsNoneOf => expected.split(',').all(|option| option.trim() != actual),
    }
}

/// Missing values sort first in ascending order.
fn compare_rows(a: &Value, b: &Value, sort: &[ColumnSort]) -> Ordering {
    for key in sort {
        let left = field(a, &key.column_id).and_then(text);
        let right = field(b, &key.column_id).and_then(text);
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(l), Some(r)) => compare_scalars(&l, &r),
        };
        let ordering = if key.descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new(vec![
            json!({"id": "1", "name": "Ann", "status": "active", "age": 31, "tags": ["a", "b"], "joined": "2024-01-05"}),
            json!({"id": "2", "name": "Bob", "status": "inactive", "age": 17, "tags": ["c"], "joined": "2023-06-01"}),
            json!({"id": "3", "name": "Cleo", "status": "active", "age": 45, "tags": [], "joined": "2024-03-20"}),
            json!({"id": "4", "name": "Dan", "status": "pending", "age": 9, "joined": null}),
            json!({"id": "5", "name": "Annika", "status": "active", "age": 22, "joined": "2022-11-11"}),
        ])
    }

    fn ids(page: &Page<Value>) -> Vec<&str> {
        page.items.iter().filter_map(|row| row["id"].as_str()).collect()
    }

    fn query(clauses: &[&str]) -> PageQuery {
        PageQuery {
            clauses: clauses.iter().map(|c| Clause::parse(c).unwrap()).collect(),
            ..PageQuery::default()
        }
    }

    #[test]
    fn paginates_with_last_page() {
        let source = source();
        let page = source
            .page(&PageQuery {
                page: 2,
                per_page: 2,
                ..PageQuery::default()
            })
            .unwrap();
        assert_eq!(ids(&page), vec!["3", "4"]);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let page = source().page(&query(&["status eq archived"])).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn numeric_and_text_clauses() {
        let source = source();
        assert_eq!(ids(&source.page(&query(&["status eq active", "age gt 18"])).unwrap()), vec!["1", "3", "5"]);
        assert_eq!(ids(&source.page(&query(&["age between 18,35"])).unwrap()), vec!["1", "5"]);
        assert_eq!(ids(&source.page(&query(&["name startsWith an"])).unwrap()), vec!["1", "5"]);
        assert_eq!(ids(&source.page(&query(&["status notIn active,pending"])).unwrap()), vec!["2"]);
    }

    #[test]
    fn dates_and_missing_fields() {
        let source = source();
        assert_eq!(ids(&source.page(&query(&["joined before 2024-01-01"])).unwrap()), vec!["2", "5"]);
        assert_eq!(ids(&source.page(&query(&["joined ne 2024-01-05"])).unwrap()), vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn array_fields_match_any_element() {
        assert_eq!(ids(&source().page(&query(&["tags in b,c"])).unwrap()), vec!["1", "2"]);
    }

    #[test]
    fn fuzzy_search_then_sort() {
        let page = source()
            .page(&PageQuery {
                search: Some("ann".into()),
                sort: vec![ColumnSort::desc("age")],
                ..PageQuery::default()
            })
            .unwrap();
        assert_eq!(ids(&page), vec!["1", "5"]);
    }

    #[test]
    fn multi_key_sort_is_stable() {
        let page = source()
            .page(&PageQuery {
                sort: vec![ColumnSort::asc("status"), ColumnSort::desc("age")],
                ..PageQuery::default()
            })
            .unwrap();
        assert_eq!(ids(&page), vec!["3", "1", "5", "2", "4"]);
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(MemorySource::from_json_str(r#"{"id": 1}"#).is_err());
        assert!(MemorySource::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"[{"id": "x", "name": "X"}]"#).unwrap();
        let source = MemorySource::from_file(&path).unwrap();
        assert_eq!(source.len(), 1);
    }
}
