//! Filter stage: keeps the rows that satisfy every active column filter.
//!
//! Filters are compiled into predicates once per run. Bound text that
//! does not parse for the column's kind compiles to `Predicate::Reject`,
//! so malformed input empties the view instead of raising an error.

use crate::pipeline::column::{parse_date_text, parse_number_text, CellValue, ValueKind};
use crate::pipeline::id::ColumnIdx;
use crate::pipeline::registry::ColumnRegistry;
use crate::pipeline::row::Row;
use crate::pipeline::state::{FilterState, FilterValue};
use chrono::{DateTime, Utc};

/// One compiled column constraint.
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Contains {
        column: ColumnIdx,
        needle: String,
    },
    NumberRange {
        column: ColumnIdx,
        min: Option<f64>,
        max: Option<f64>,
    },
    DateRange {
        column: ColumnIdx,
        min: Option<DateTime<Utc>>,
        max: Option<DateTime<Utc>>,
    },
    /// A bound could not be parsed: nothing matches.
    Reject,
}

impl Predicate {
    fn matches<T>(&self, row: &Row<T>, registry: &ColumnRegistry<T>) -> bool {
        match self {
            Predicate::Contains { column, needle } => registry
                .resolve_at(row, *column)
                .as_text()
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            Predicate::NumberRange { column, min, max } => registry
                .resolve_at(row, *column)
                .as_number()
                .is_some_and(|n| within(n, *min, *max)),
            Predicate::DateRange { column, min, max } => registry
                .resolve_at(row, *column)
                .as_date()
                .is_some_and(|d| within(d, *min, *max)),
            Predicate::Reject => false,
        }
    }
}

/// Closed-interval membership with either side optional.
fn within<V: PartialOrd + Copy>(value: V, min: Option<V>, max: Option<V>) -> bool {
    min.map_or(true, |bound| bound <= value) && max.map_or(true, |bound| value <= bound)
}

/// Parse an optional bound. `Ok(None)` is an open side, `Err` a malformed one.
fn parse_bound<V>(raw: &Option<String>, parse: fn(&str) -> Option<V>) -> Result<Option<V>, ()> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse(text).map(Some).ok_or(()),
    }
}

/// Date bounds accept date text or epoch milliseconds, like date cells do.
fn parse_date_bound(text: &str) -> Option<DateTime<Utc>> {
    parse_date_text(text).or_else(|| {
        parse_number_text(text)
            .filter(|n| n.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
    })
}

fn compile_one(column: ColumnIdx, kind: ValueKind, value: &FilterValue) -> Option<Predicate> {
    match (kind, value) {
        (ValueKind::Text, FilterValue::Text(fragment)) if !fragment.is_empty() => {
            Some(Predicate::Contains {
                column,
                needle: fragment.to_lowercase(),
            })
        }
        (ValueKind::Number, FilterValue::Range { min, max }) => {
            let bounds = (
                parse_bound(min, parse_number_text),
                parse_bound(max, parse_number_text),
            );
            match bounds {
                (Ok(None), Ok(None)) => None,
                (Ok(min), Ok(max)) => Some(Predicate::NumberRange { column, min, max }),
                _ => Some(Predicate::Reject),
            }
        }
        (ValueKind::Date, FilterValue::Range { min, max }) => {
            let bounds = (
                parse_bound(min, parse_date_bound),
                parse_bound(max, parse_date_bound),
            );
            match bounds {
                (Ok(None), Ok(None)) => None,
                (Ok(min), Ok(max)) => Some(Predicate::DateRange { column, min, max }),
                _ => Some(Predicate::Reject),
            }
        }
        _ => None,
    }
}

fn compile<T>(filters: &FilterState, registry: &ColumnRegistry<T>) -> Vec<Predicate> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (column_id, value) in filters.iter() {
        let (column, kind) = match registry.require_filterable(column_id) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Ignoring filter: {}", e);
                continue;
            }
        };
        if !value.fits(kind) {
            tracing::warn!("Ignoring {:?} filter on {} column '{}'", value, kind, column_id);
            continue;
        }
        if let Some(predicate) = compile_one(column, kind, value) {
            predicates.push(predicate);
        }
    }
    predicates
}

/// Keep the entries of `input` whose rows pass every filter, in input order.
pub fn apply<T>(
    rows: &[Row<T>],
    input: &[usize],
    filters: &FilterState,
    registry: &ColumnRegistry<T>,
) -> Vec<usize> {
    let predicates = compile(filters, registry);
    if predicates.is_empty() {
        return input.to_vec();
    }
    if predicates.contains(&Predicate::Reject) {
        return Vec::new();
    }

    input
        .iter()
        .copied()
        .filter(|&i| predicates.iter().all(|p| p.matches(&rows[i], registry)))
        .collect()
}

/// Whether a single cell satisfies `value` for a column of `kind`.
///
/// Used by callers that want to preview a filter against one value without
/// running the stage.
pub fn cell_matches(cell: &CellValue, kind: ValueKind, value: &FilterValue) -> bool {
    match compile_one(ColumnIdx(0), kind, value) {
        None => true,
        Some(Predicate::Contains { needle, .. }) => cell
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
        Some(Predicate::NumberRange { min, max, .. }) => {
            cell.as_number().is_some_and(|n| within(n, min, max))
        }
        Some(Predicate::DateRange { min, max, .. }) => {
            cell.as_date().is_some_and(|d| within(d, min, max))
        }
        Some(Predicate::Reject) => false,
    }
}
