//! Column filter codec.
//!
//! Wire form is a JSON array; each entry carries the column id, the payload,
//! the variant tag and the operator token:
//!
//! ```text
//! [{"id":"status","value":"active","variant":"select","operator":"eq"},
//!  {"id":"age","value":[18,65],"variant":"range","operator":"between"}]
//! ```
//!
//! Payload shapes per variant: `text`, `number`, `select` take a string
//! (`number` also accepts a JSON number); `range` takes a two-number array;
//! `date` takes a `YYYY-MM-DD` string; `dateRange` a pair of them;
//! `multiSelect` an array of strings.
//!
//! Unlike sorting, filters validate per entry: an entry with an unknown
//! column, unknown variant, disallowed operator or malformed payload is
//! dropped and the rest are kept. Only a structurally invalid document (not
//! JSON, not an array) fails the decode. A repeated column keeps its first
//! entry.

use super::Codec;
use crate::domain::{ColumnFilter, ColumnFiltersState, FilterOperator, FilterValue, FilterVariant};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::BTreeSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Codec for [`ColumnFiltersState`], validating columns and operators.
#[derive(Debug, Clone, Default)]
pub struct FiltersCodec {
    known_columns: BTreeSet<String>,
}

impl FiltersCodec {
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

    fn encode_value(value: &FilterValue) -> Value {
        match value {
            FilterValue::Text(s) | FilterValue::Number(s) | FilterValue::Select(s) => json!(s),
            FilterValue::Range(min, max) => json!([min, max]),
            FilterValue::Date(d) => json!(d.format(DATE_FORMAT).to_string()),
            FilterValue::DateRange(from, to) => json!([
                from.format(DATE_FORMAT).to_string(),
                to.format(DATE_FORMAT).to_string()
            ]),
            FilterValue::MultiSelect(values) => json!(values),
        }
    }

    fn decode_value(variant: FilterVariant, raw: &Value) -> Option<FilterValue> {
        let date = |v: &Value| {
            v.as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        };
        let number = |v: &Value| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .filter(|n| n.is_finite())
        };
        let pair = |v: &Value| match v.as_array().map(Vec::as_slice) {
            Some([a, b]) => Some((a.clone(), b.clone())),
            _ => None,
        };

        match variant {
            FilterVariant::Text => raw.as_str().map(|s| FilterValue::Text(s.to_string())),
            FilterVariant::Select => raw.as_str().map(|s| FilterValue::Select(s.to_string())),
            FilterVariant::Number => match raw {
                Value::String(s) if s.trim().is_empty() || s.trim().parse::<f64>().is_ok() => {
                    Some(FilterValue::Number(s.clone()))
                }
                Value::Number(n) => Some(FilterValue::Number(n.to_string())),
                _ => None,
            },
            FilterVariant::Range => {
                let (a, b) = pair(raw)?;
                Some(FilterValue::Range(number(&a)?, number(&b)?))
            }
            FilterVariant::Date => date(raw).map(FilterValue::Date),
            FilterVariant::DateRange => {
                let (a, b) = pair(raw)?;
                Some(FilterValue::DateRange(date(&a)?, date(&b)?))
            }
            FilterVariant::MultiSelect => raw
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
                .map(FilterValue::MultiSelect),
        }
    }

    fn decode_entry(&self, entry: &Value) -> Option<ColumnFilter> {
        let id = entry.get("id")?.as_str()?;
        if !self.known_columns.contains(id) {
            tracing::debug!(column = %id, "filter names unknown column");
            return None;
        }
        let variant = FilterVariant::parse(entry.get("variant")?.as_str()?)?;
        let operator = match entry.get("operator") {
            None | Some(Value::Null) => variant.default_operator(),
            Some(op) => FilterOperator::parse(op.as_str()?)?,
        };
        if !variant.permits(operator) {
            tracing::debug!(column = %id, %variant, %operator, "operator not permitted");
            return None;
        }
        let value = Self::decode_value(variant, entry.get("value")?)?;
        Some(ColumnFilter {
            column_id: id.to_string(),
            operator,
            value,
        })
    }
}

impl Codec for FiltersCodec {
    type Value = ColumnFiltersState;

    fn encode(&self, filters: &ColumnFiltersState) -> String {
        let entries: Vec<Value> = filters
            .iter()
            .map(|f| {
                json!({
                    "id": f.column_id,
                    "value": Self::encode_value(&f.value),
                    "variant": f.variant().as_str(),
                    "operator": f.operator.as_str(),
                })
            })
            .collect();
        Value::Array(entries).to_string()
    }

    fn decode(&self, raw: &str) -> Option<ColumnFiltersState> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| tracing::debug!(error = %e, "filters are not valid JSON"))
            .ok()?;
        let Value::Array(entries) = parsed else {
            tracing::debug!("filters are not a JSON array");
            return None;
        };

        let mut seen = BTreeSet::new();
        let mut filters = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.decode_entry(entry) {
                Some(filter) if seen.insert(filter.column_id.clone()) => filters.push(filter),
                Some(filter) => {
                    tracing::debug!(column = %filter.column_id, "duplicate filter dropped");
                }
                None => tracing::debug!(entry = %entry, "invalid filter dropped"),
            }
        }
        Some(filters)
    }
}
