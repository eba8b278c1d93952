//! View state owned by the pipeline: filters, sort specification and
//! pagination, plus the derived [`ViewState`] handed to consumers.
//!
//! Every type here is plain data with value equality. The executor uses that
//! equality as the memoization key for the stage each slice feeds.

use crate::pipeline::column::ValueKind;
use crate::pipeline::id::Generation;
use crate::pipeline::stages::paginate;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ==================== Filters ====================

/// Constraint entered for one column.
///
/// Range bounds are kept as the raw text the user typed. They are parsed when
/// the filter stage runs, and a bound that does not parse for the column's
/// kind matches no row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue {
    /// Case-insensitive substring for text columns.
    Text(String),
    /// Closed interval for number and date columns. Either side may be open.
    Range {
        min: Option<String>,
        max: Option<String>,
    },
}

impl FilterValue {
    pub fn text(fragment: impl Into<String>) -> Self {
        FilterValue::Text(fragment.into())
    }

    pub fn range(min: Option<&str>, max: Option<&str>) -> Self {
        FilterValue::Range {
            min: min.map(str::to_string),
            max: max.map(str::to_string),
        }
    }

    pub fn number_range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range {
            min: min.map(|n| n.to_string()),
            max: max.map(|n| n.to_string()),
        }
    }

    pub fn date_range(min: Option<DateTime<Utc>>, max: Option<DateTime<Utc>>) -> Self {
        let fmt = |d: DateTime<Utc>| d.to_rfc3339_opts(SecondsFormat::Millis, true);
        FilterValue::Range {
            min: min.map(fmt),
            max: max.map(fmt),
        }
    }

    /// An empty filter places no constraint and is dropped from the state.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(fragment) => fragment.is_empty(),
            FilterValue::Range { min, max } => {
                let blank = |b: &Option<String>| b.as_deref().map_or(true, |s| s.trim().is_empty());
                blank(min) && blank(max)
            }
        }
    }

    /// Whether this kind of filter can be applied to a column of `kind`.
    pub fn fits(&self, kind: ValueKind) -> bool {
        match self {
            FilterValue::Text(_) => kind == ValueKind::Text,
            FilterValue::Range { .. } => matches!(kind, ValueKind::Number | ValueKind::Date),
        }
    }
}

/// Active filters keyed by column id. Only non-empty filters are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState(BTreeMap<String, FilterValue>);

impl FilterState {
    pub fn get(&self, column_id: &str) -> Option<&FilterValue> {
        self.0.get(column_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Store `value`, or remove the entry when it is empty. Returns whether
    /// anything changed.
    pub(crate) fn set(&mut self, column_id: &str, value: FilterValue) -> bool {
        if value.is_empty() {
            return self.0.remove(column_id).is_some();
        }
        match self.0.get(column_id) {
            Some(existing) if *existing == value => false,
            _ => {
                self.0.insert(column_id.to_string(), value);
                true
            }
        }
    }

    pub(crate) fn remove(&mut self, column_id: &str) -> bool {
        self.0.remove(column_id).is_some()
    }

    pub(crate) fn clear(&mut self) -> bool {
        let changed = !self.0.is_empty();
        self.0.clear();
        changed
    }
}

// ==================== Sorting ====================

/// One entry of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub column_id: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: false,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: true,
        }
    }
}

/// Prioritized sort keys, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }

    pub fn unsorted() -> Self {
        Self(Vec::new())
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Direction of `column_id` in this spec: `Some(true)` for descending.
    pub fn direction_of(&self, column_id: &str) -> Option<bool> {
        self.0
            .iter()
            .find(|key| key.column_id == column_id)
            .map(|key| key.descending)
    }

    pub(crate) fn keys_mut(&mut self) -> &mut Vec<SortKey> {
        &mut self.0
    }
}

impl From<Vec<SortKey>> for SortSpec {
    fn from(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }
}

// ==================== Pagination ====================

/// Requested page window. `page_size` is never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl PaginationState {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    pub fn page_count(&self, filtered_rows: usize) -> usize {
        paginate::page_count(filtered_rows, self.page_size)
    }

    /// Clamp `page_index` into range for `filtered_rows`. Returns whether it moved.
    pub(crate) fn clamp(&mut self, filtered_rows: usize) -> bool {
        let last = self.page_count(filtered_rows) - 1;
        if self.page_index > last {
            self.page_index = last;
            true
        } else {
            false
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

// ==================== Aggregate state ====================

/// The mutable view state of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub filters: FilterState,
    pub sort: SortSpec,
    pub pagination: PaginationState,
}

/// The most recent fetch failure that happened after the applied snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    pub generation: Generation,
    pub message: String,
}

/// Snapshot of the pipeline state plus everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub state: PipelineState,
    /// Generation of the applied snapshot (`Generation::ZERO` before the first).
    pub generation: Generation,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub page_count: usize,
    pub can_previous_page: bool,
    pub can_next_page: bool,
    pub last_fetch_error: Option<FetchError>,
}

impl ViewState {
    pub fn page_index(&self) -> usize {
        self.state.pagination.page_index
    }

    pub fn page_size(&self) -> usize {
        self.state.pagination.page_size
    }

    pub fn has_fetch_error(&self) -> bool {
        self.last_fetch_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_emptiness() {
        assert!(FilterValue::text("").is_empty());
        assert!(!FilterValue::text("doe").is_empty());
        assert!(FilterValue::range(None, None).is_empty());
        assert!(FilterValue::range(Some("  "), Some("")).is_empty());
        assert!(!FilterValue::range(Some("10"), None).is_empty());
    }

    #[test]
    fn test_filter_value_fits_kind() {
        assert!(FilterValue::text("a").fits(ValueKind::Text));
        assert!(!FilterValue::text("a").fits(ValueKind::Number));
        assert!(FilterValue::number_range(Some(1.0), None).fits(ValueKind::Date));
        assert!(!FilterValue::number_range(Some(1.0), None).fits(ValueKind::Text));
    }

    #[test]
    fn test_filter_state_set_removes_empty() {
        let mut filters = FilterState::default();
        assert!(filters.set("name", FilterValue::text("doe")));
        assert!(!filters.set("name", FilterValue::text("doe")));
        assert_eq!(filters.len(), 1);
        assert!(filters.set("name", FilterValue::text("")));
        assert!(filters.is_empty());
        assert!(!filters.set("name", FilterValue::text("")));
    }

    #[test]
    fn test_sort_spec_direction() {
        let spec = SortSpec::new(vec![SortKey::desc("age"), SortKey::asc("name")]);
        assert_eq!(spec.direction_of("age"), Some(true));
        assert_eq!(spec.direction_of("name"), Some(false));
        assert_eq!(spec.direction_of("email"), None);
    }

    #[test]
    fn test_pagination_clamp() {
        let mut pagination = PaginationState::new(5, 10);
        assert!(pagination.clamp(12));
        assert_eq!(pagination.page_index, 1);
        assert!(!pagination.clamp(12));

        assert!(pagination.clamp(0));
        assert_eq!(pagination.page_index, 0);
    }

    #[test]
    fn test_pagination_size_floor() {
        assert_eq!(PaginationState::with_page_size(0).page_size, 1);
        assert_eq!(PaginationState::default().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_state_serializes() {
        let state = PipelineState {
            sort: SortSpec::new(vec![SortKey::desc("occupiedTimestamp")]),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
