//! Column filter model.
//!
//! A [`ColumnFilter`] pairs a column id with an operator and a typed payload.
//! The payload is a tagged union ([`FilterValue`]) keyed by [`FilterVariant`],
//! so each variant carries exactly the data valid for that kind of filter.
//!
//! Operators are a single enum because the permitted set per variant is a
//! runtime rule: a filter decoded from a user-edited URL may name any operator
//! and must be checked with [`FilterVariant::permits`].
//!
//! | variant        | default      | permitted                                  |
//! |----------------|--------------|--------------------------------------------|
//! | `text`         | `contains`   | contains, eq, startsWith, endsWith         |
//! | `number`       | `eq`         | eq, ne, lt, lte, gt, gte, between          |
//! | `range`        | `between`    | between                                    |
//! | `date`         | `eq`         | eq, before, after, between                 |
//! | `dateRange`    | `eq`         | eq, before, after, between                 |
//! | `select`       | `eq`         | eq, ne                                     |
//! | `multiSelect`  | `in`         | in, notIn                                  |

use chrono::NaiveDate;
use std::fmt;

/// Kind of filter attached to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterVariant {
    Text,
    Number,
    Range,
    Date,
    DateRange,
    Select,
    MultiSelect,
}

impl FilterVariant {
    /// All variants, in table order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Number,
        Self::Range,
        Self::Date,
        Self::DateRange,
        Self::Select,
        Self::MultiSelect,
    ];

    /// Wire tag used in the URL filter encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Range => "range",
            Self::Date => "date",
            Self::DateRange => "dateRange",
            Self::Select => "select",
            Self::MultiSelect => "multiSelect",
        }
    }

    /// Parses a wire tag. Unknown tags yield `None`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == tag)
    }

    /// Operator applied when the caller does not pick one.
    #[must_use]
    pub const fn default_operator(self) -> FilterOperator {
        match self {
            Self::Text => FilterOperator::Contains,
            Self::Number | Self::Date | Self::DateRange | Self::Select => FilterOperator::Equals,
            Self::Range => FilterOperator::IsBetween,
            Self::MultiSelect => FilterOperator::IsAnyOf,
        }
    }

    /// Operators a filter of this variant may use.
    #[must_use]
    pub const fn permitted_operators(self) -> &'static [FilterOperator] {
        use FilterOperator as Op;
        match self {
            Self::Text => &[Op::Contains, Op::Equals, Op::StartsWith, Op::EndsWith],
            Self::Number => &[
                Op::Equals,
                Op::NotEquals,
                Op::LessThan,
                Op::LessOrEqual,
                Op::GreaterThan,
                Op::GreaterOrEqual,
                Op::IsBetween,
            ],
            Self::Range => &[Op::IsBetween],
            Self::Date | Self::DateRange => &[Op::Equals, Op::IsBefore, Op::IsAfter, Op::IsBetween],
            Self::Select => &[Op::Equals, Op::NotEquals],
            Self::MultiSelect => &[Op::IsAnyOf, Op::IsNoneOf],
        }
    }

    /// Returns `true` if `operator` is allowed for this variant.
    #[must_use]
    pub fn permits(self, operator: FilterOperator) -> bool {
        self.permitted_operators().contains(&operator)
    }
}

impl fmt::Display for FilterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    IsBetween,
    IsBefore,
    IsAfter,
    IsAnyOf,
    IsNoneOf,
}

impl FilterOperator {
    /// All operators.
    pub const ALL: [Self; 14] = [
        Self::Contains,
        Self::Equals,
        Self::StartsWith,
        Self::EndsWith,
        Self::NotEquals,
        Self::LessThan,
        Self::LessOrEqual,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::IsBetween,
        Self::IsBefore,
        Self::IsAfter,
        Self::IsAnyOf,
        Self::IsNoneOf,
    ];

    /// Token used both in the URL encoding and in the filter expression.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "eq",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::NotEquals => "ne",
            Self::LessThan => "lt",
            Self::LessOrEqual => "lte",
            Self::GreaterThan => "gt",
            Self::GreaterOrEqual => "gte",
            Self::IsBetween => "between",
            Self::IsBefore => "before",
            Self::IsAfter => "after",
            Self::IsAnyOf => "in",
            Self::IsNoneOf => "notIn",
        }
    }

    /// Parses an operator token. Unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter payload, tagged by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Free text.
    Text(String),
    /// A number kept in its textual form, as typed.
    Number(String),
    /// Inclusive numeric bounds.
    Range(f64, f64),
    /// A single calendar date.
    Date(NaiveDate),
    /// Inclusive calendar date bounds.
    DateRange(NaiveDate, NaiveDate),
    /// One option out of a fixed set.
    Select(String),
    /// Any number of options out of a fixed set.
    MultiSelect(Vec<String>),
}

impl FilterValue {
    /// The variant this payload belongs to.
    #[must_use]
    pub const fn variant(&self) -> FilterVariant {
        match self {
            Self::Text(_) => FilterVariant::Text,
            Self::Number(_) => FilterVariant::Number,
            Self::Range(..) => FilterVariant::Range,
            Self::Date(_) => FilterVariant::Date,
            Self::DateRange(..) => FilterVariant::DateRange,
            Self::Select(_) => FilterVariant::Select,
            Self::MultiSelect(_) => FilterVariant::MultiSelect,
        }
    }

    /// Returns `true` when the payload carries nothing to filter on.
    ///
    /// Blank strings and empty option lists count as empty; bounded payloads
    /// never do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) | Self::Number(s) | Self::Select(s) => s.trim().is_empty(),
            Self::MultiSelect(values) => values.iter().all(|v| v.trim().is_empty()),
            Self::Range(..) | Self::Date(_) | Self::DateRange(..) => false,
        }
    }

    /// Renders the payload for a filter-expression clause.
    ///
    /// Pairs and lists are comma-joined.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) | Self::Number(s) | Self::Select(s) => s.trim().to_string(),
            Self::Range(min, max) => format!("{min},{max}"),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateRange(from, to) => {
                format!("{},{}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
            }
            Self::MultiSelect(values) => values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// A filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    /// Column the filter applies to.
    pub column_id: String,
    /// Comparison to apply.
    pub operator: FilterOperator,
    /// Typed payload.
    pub value: FilterValue,
}

impl ColumnFilter {
    /// Creates a filter using the variant's default operator.
    ///
    /// # Example
    ///
    /// ```
    /// use tablesync::domain::{ColumnFilter, FilterOperator, FilterValue};
    ///
    /// let filter = ColumnFilter::new("status", FilterValue::Select("active".into()));
    /// assert_eq!(filter.operator, FilterOperator::Equals);
    /// ```
    pub fn new(column_id: impl Into<String>, value: FilterValue) -> Self {
        let operator = value.variant().default_operator();
        Self {
            column_id: column_id.into(),
            operator,
            value,
        }
    }

    /// Replaces the operator.
    #[must_use]
    pub const fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    /// The payload's variant.
    #[must_use]
    pub const fn variant(&self) -> FilterVariant {
        self.value.variant()
    }

    /// Returns `true` if this filter may be sent to the server: the operator
    /// is permitted for the variant and the payload is not empty.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.variant().permits(self.operator) && !self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_operator_is_permitted() {
        for variant in FilterVariant::ALL {
            assert!(variant.permits(variant.default_operator()), "{variant}");
        }
    }

    #[test]
    fn tokens_parse_back() {
        for op in FilterOperator::ALL {
            assert_eq!(FilterOperator::parse(op.as_str()), Some(op));
        }
        for variant in FilterVariant::ALL {
            assert_eq!(FilterVariant::parse(variant.as_str()), Some(variant));
        }
        assert_eq!(FilterOperator::parse("iLike"), None);
        assert_eq!(FilterVariant::parse("boolean"), None);
    }

    #[test]
    fn select_rejects_range_operators() {
        let filter = ColumnFilter::new("status", FilterValue::Select("active".into()))
            .with_operator(FilterOperator::IsBetween);
        assert!(!filter.is_active());
    }

    #[test]
    fn empty_payloads_are_inactive() {
        assert!(!ColumnFilter::new("name", FilterValue::Text("  ".into())).is_active());
        assert!(!ColumnFilter::new("tags", FilterValue::MultiSelect(vec![])).is_active());
        assert!(ColumnFilter::new("age", FilterValue::Range(18.0, 65.0)).is_active());
    }

    #[test]
    fn renders_pairs_comma_joined() {
        assert_eq!(FilterValue::Range(18.0, 65.0).render(), "18,65");
        assert_eq!(FilterValue::Range(0.5, 2.25).render(), "0.5,2.25");
        let from = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(FilterValue::DateRange(from, to).render(), "2024-01-02,2024-03-04");
        assert_eq!(
            FilterValue::MultiSelect(vec!["a".into(), " ".into(), "b".into()]).render(),
            "a,b"
        );
    }
}
