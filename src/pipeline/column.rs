//! Column declarations and the values their accessors produce.
//!
//! A [`Column`] pairs an id and header with an optional accessor and an
//! explicit [`ValueKind`]. The kind decides how the sort and filter stages
//! read a [`CellValue`]: every coercion below is total and reports an
//! invalid value as `None` instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// How a column's values are compared and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Number,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// The result of running a column accessor against an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    #[default]
    Missing,
}

/// Format used when a date cell is rendered as text.
pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric reading of the value. NaN and unparseable text are invalid.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_number_text(s),
            CellValue::Date(d) => Some(d.timestamp_millis() as f64),
            CellValue::Missing => None,
        }
    }

    /// Date reading of the value. Numbers are taken as epoch milliseconds.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Text(s) => parse_date_text(s),
            CellValue::Number(n) if n.is_finite() => DateTime::from_timestamp_millis(*n as i64),
            CellValue::Number(_) => None,
            CellValue::Missing => None,
        }
    }

    /// Text reading of the value, as it would be displayed.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            CellValue::Number(n) => Some(Cow::Owned(n.to_string())),
            CellValue::Date(d) => Some(Cow::Owned(d.format(DATE_DISPLAY_FORMAT).to_string())),
            CellValue::Missing => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("/"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Date(value)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

/// Parse user or wire text as a number. Blank text, NaN and garbage are `None`.
pub fn parse_number_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Parse user or wire text as a UTC timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` (both read
/// as UTC) and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Maps an entity to the value shown and compared in one column.
pub type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// Declaration of one table column.
///
/// ```ignore
/// let age = Column::new("age", "Age")
///     .accessor(|p: &Person| CellValue::from(p.age))
///     .kind(ValueKind::Number)
///     .sortable()
///     .filterable();
/// ```
pub struct Column<T> {
    id: String,
    header: String,
    accessor: Option<Accessor<T>>,
    kind: Option<ValueKind>,
    sortable: bool,
    filterable: bool,
}

impl<T> Column<T> {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: None,
            kind: None,
            sortable: false,
            filterable: false,
        }
    }

    pub fn accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn value_kind(&self) -> Option<ValueKind> {
        self.kind
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Run the accessor. Columns without one always yield `Missing`.
    pub fn evaluate(&self, entity: &T) -> CellValue {
        match &self.accessor {
            Some(accessor) => accessor(entity),
            None => CellValue::Missing,
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            accessor: self.accessor.clone(),
            kind: self.kind,
            sortable: self.sortable,
            filterable: self.filterable,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("kind", &self.kind)
            .field("accessor", &self.accessor.is_some())
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_number_coercion() {
        assert_eq!(CellValue::Number(3.5).as_number(), Some(3.5));
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(CellValue::from("forty").as_number(), None);
        assert_eq!(CellValue::Missing.as_number(), None);
    }

    #[test]
    fn test_date_coercion() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(CellValue::from("2024-05-01T12:30:00Z").as_date(), Some(expected));
        assert_eq!(CellValue::from("2024-05-01T14:30:00+02:00").as_date(), Some(expected));
        assert_eq!(CellValue::from("2024-05-01 12:30:00").as_date(), Some(expected));
        assert_eq!(
            CellValue::from("2024-05-01").as_date(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(CellValue::from("yesterday").as_date(), None);
        assert_eq!(
            CellValue::Number(expected.timestamp_millis() as f64).as_date(),
            Some(expected)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Missing.to_string(), "/");
        assert_eq!(CellValue::from("Zone A").to_string(), "Zone A");
        assert_eq!(CellValue::Number(45.5).to_string(), "45.5");
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_optional_into_missing() {
        let zone: Option<&str> = None;
        assert!(CellValue::from(zone).is_missing());
        assert_eq!(CellValue::from(Some("B")), CellValue::Text("B".to_string()));
    }

    #[test]
    fn test_column_builder() {
        let column: Column<f64> = Column::new("value", "Value")
            .accessor(|v| CellValue::Number(*v))
            .kind(ValueKind::Number)
            .sortable();

        assert_eq!(column.id(), "value");
        assert!(column.is_sortable());
        assert!(!column.is_filterable());
        assert_eq!(column.evaluate(&2.0), CellValue::Number(2.0));

        let display_only: Column<f64> = Column::new("actions", "Actions");
        assert!(!display_only.has_accessor());
        assert!(display_only.evaluate(&2.0).is_missing());
    }
}
