//! Request parameters as a source sees them.
//!
//! This is the inverse of [`build_query_params`](crate::query::build_query_params):
//! the `filter` expression is split on the conjunction and each clause
//! parsed as `<column> <operator> <value>`. A value that itself contains the
//! conjunction cannot be told apart from two clauses.

use crate::domain::{ColumnSort, FilterOperator, Result, TableSyncError, DEFAULT_PAGE_SIZE};
use crate::query::{QueryOptions, QueryParams};

/// One parsed filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: String,
    pub operator: FilterOperator,
    /// Rendered value, e.g. `active`, `18,65` or `a,b,c`.
    pub value: String,
}

impl Clause {
    /// Parses `"<column> <operator> <value>"`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing part or unknown operator.
    pub fn parse(clause: &str) -> Result<Self> {
        let mut parts = clause.trim().splitn(3, ' ');
        let (Some(column), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TableSyncError::Validation(format!("malformed filter clause `{clause}`")));
        };
        let operator = FilterOperator::parse(operator)
            .ok_or_else(|| TableSyncError::Validation(format!("unknown filter operator `{operator}`")))?;
        Ok(Self {
            column: column.to_string(),
            operator,
            value: value.to_string(),
        })
    }
}

/// A page request: which rows, in what order, on which page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// One-based page number.
    pub page: usize,
    pub per_page: usize,
    pub search: Option<String>,
    pub clauses: Vec<Clause>,
    pub sort: Vec<ColumnSort>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            search: None,
            clauses: Vec::new(),
            sort: Vec::new(),
        }
    }
}

fn positive(key: &str, raw: Option<&str>, default: usize) -> Result<usize> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| TableSyncError::Validation(format!("`{key}` must be a positive integer, got `{raw}`"))),
    }
}

fn parse_sort(expression: &str) -> Result<Vec<ColumnSort>> {
    expression
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| match entry.trim().rsplit_once(':') {
            Some((column, "asc")) => Ok(ColumnSort::asc(column)),
            Some((column, "desc")) => Ok(ColumnSort::desc(column)),
            _ => Err(TableSyncError::Validation(format!("malformed sort entry `{entry}`"))),
        })
        .collect()
}

impl PageQuery {
    /// Parses request parameters named per `options`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a page number, page size, sort entry or
    /// filter clause is malformed.
    pub fn from_params(params: &QueryParams, options: &QueryOptions) -> Result<Self> {
        let page = positive(&options.page_key, params.get(&options.page_key), 1)?;
        let per_page = positive(&options.per_page_key, params.get(&options.per_page_key), DEFAULT_PAGE_SIZE)?;

        let search = params
            .get(&options.search_key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let clauses = match params.get(&options.filter_key) {
            Some(expression) => expression
                .split(options.conjunction.as_str())
                .filter(|c| !c.trim().is_empty())
                .map(Clause::parse)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let sort = params.get(&options.sort_key).map_or_else(|| Ok(Vec::new()), parse_sort)?;

        Ok(Self {
            page,
            per_page,
            search,
            clauses,
            sort,
        })
    }

    /// Index of the first row on the requested page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_request() {
        let params = QueryParams::from_query_string(
            "search=ann&filter=status+eq+active+and+age+between+18%2C65&sort=name%3Adesc%2Cemail%3Aasc&page=2&perPage=10",
        );
        let query = PageQuery::from_params(&params, &QueryOptions::default()).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.per_page, 10);
        assert_eq!(query.offset(), 10);
        assert_eq!(query.search.as_deref(), Some("ann"));
        assert_eq!(
            query.clauses,
            vec![
                Clause {
                    column: "status".into(),
                    operator: FilterOperator::Equals,
                    value: "active".into()
                },
                Clause {
                    column: "age".into(),
                    operator: FilterOperator::IsBetween,
                    value: "18,65".into()
                },
            ]
        );
        assert_eq!(query.sort, vec![ColumnSort::desc("name"), ColumnSort::asc("email")]);
    }

    #[test]
    fn defaults_when_absent() {
        let query = PageQuery::from_params(&QueryParams::new(), &QueryOptions::default()).unwrap();
        assert_eq!(query, PageQuery::default());
    }

    #[test]
    fn clause_value_keeps_spaces() {
        let clause = Clause::parse("name contains ann lee").unwrap();
        assert_eq!(clause.value, "ann lee");
    }

    #[test]
    fn rejects_malformed_input() {
        let options = QueryOptions::default();
        for query in ["page=0", "perPage=abc", "sort=name%3Aup", "filter=name+like+x", "filter=name"] {
            let params = QueryParams::from_query_string(query);
            assert!(PageQuery::from_params(&params, &options).is_err(), "{query}");
        }
    }
}
