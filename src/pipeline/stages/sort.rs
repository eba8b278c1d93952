//! Sort stage: multi-key ordering with a fixed missing-value policy.
//!
//! Each row is decorated with its sort values once, then the decorated
//! vector is sorted with the input position as the final tie-break, so the
//! result is stable whatever algorithm the standard library picks.
//!
//! Missing and invalid values sort after every valid value in both
//! directions. `descending` only reverses the comparison of valid values.

use crate::pipeline::column::{CellValue, ValueKind};
use crate::pipeline::id::ColumnIdx;
use crate::pipeline::registry::ColumnRegistry;
use crate::pipeline::row::Row;
use crate::pipeline::state::SortSpec;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization as _;

/// Ordering key for text that approximates locale collation.
///
/// Levels are compared in order: base letters without accents or case,
/// then case-folded text, then the raw text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: String,
    secondary: String,
    tertiary: String,
}

impl CollationKey {
    pub fn new(text: &str) -> Self {
        Self {
            primary: text
                .nfkd()
                .filter(|c| !is_combining_mark(*c))
                .flat_map(char::to_lowercase)
                .collect(),
            secondary: text.to_lowercase(),
            tertiary: text.to_string(),
        }
    }
}

/// A valid value for one sort key.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(CollationKey),
    Number(f64),
    Date(DateTime<Utc>),
}

impl SortValue {
    fn read(cell: &CellValue, kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Text => cell.as_text().map(|t| SortValue::Text(CollationKey::new(&t))),
            ValueKind::Number => cell.as_number().map(SortValue::Number),
            ValueKind::Date => cell.as_date().map(SortValue::Date),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            // One key always reads one kind.
            _ => Ordering::Equal,
        }
    }
}

/// Compare one key of two rows. `None` (missing/invalid) is always last.
fn compare_key(a: &Option<SortValue>, b: &Option<SortValue>, descending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.compare(b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

struct PlannedKey {
    column: ColumnIdx,
    kind: ValueKind,
    descending: bool,
}

fn plan<T>(spec: &SortSpec, registry: &ColumnRegistry<T>) -> Vec<PlannedKey> {
    spec.keys()
        .iter()
        .filter_map(|key| match registry.require_sortable(&key.column_id) {
            Ok((column, kind)) => Some(PlannedKey {
                column,
                kind,
                descending: key.descending,
            }),
            Err(e) => {
                tracing::warn!("Ignoring sort key: {}", e);
                None
            }
        })
        .collect()
}

struct Decorated {
    position: usize,
    row: usize,
    values: Vec<Option<SortValue>>,
}

/// Reorder `input` by `spec`. An empty spec returns the input order.
pub fn apply<T>(
    rows: &[Row<T>],
    input: &[usize],
    spec: &SortSpec,
    registry: &ColumnRegistry<T>,
) -> Vec<usize> {
    let keys = plan(spec, registry);
    if keys.is_empty() {
        return input.to_vec();
    }

    let mut decorated: Vec<Decorated> = input
        .iter()
        .enumerate()
        .map(|(position, &row)| Decorated {
            position,
            row,
            values: keys
                .iter()
                .map(|key| SortValue::read(registry.resolve_at(&rows[row], key.column), key.kind))
                .collect(),
        })
        .collect();

    decorated.sort_unstable_by(|a, b| {
        keys.iter()
            .enumerate()
            .map(|(i, key)| compare_key(&a.values[i], &b.values[i], key.descending))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
            .then(a.position.cmp(&b.position))
    });

    decorated.into_iter().map(|d| d.row).collect()
}
