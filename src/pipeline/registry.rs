//! Column registry fixed at pipeline construction.
//!
//! Validation happens once, here: a registry that exists is known to have
//! unique ids and an accessor plus value kind on every sortable or filterable
//! column, so the stages can rely on both without re-checking.

use crate::pipeline::column::{CellValue, Column, ValueKind};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::ColumnIdx;
use crate::pipeline::row::Row;
use std::collections::HashMap;

pub struct ColumnRegistry<T> {
    columns: Vec<Column<T>>,
    by_id: HashMap<String, ColumnIdx>,
}

impl<T> ColumnRegistry<T> {
    /// Validate and register `columns` in display order.
    pub fn new(columns: Vec<Column<T>>) -> PipelineResult<Self> {
        let mut by_id = HashMap::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            if column.id().is_empty() {
                return Err(PipelineError::EmptyColumnId(column.header().to_string()));
            }
            if column.is_sortable() || column.is_filterable() {
                if !column.has_accessor() {
                    return Err(PipelineError::MissingAccessor(column.id().to_string()));
                }
                if column.value_kind().is_none() {
                    return Err(PipelineError::MissingValueKind(column.id().to_string()));
                }
            }
            if by_id
                .insert(column.id().to_string(), ColumnIdx(i as u32))
                .is_some()
            {
                return Err(PipelineError::DuplicateColumn(column.id().to_string()));
            }
        }

        tracing::debug!("Registered {} columns", columns.len());
        Ok(Self { columns, by_id })
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column_id: &str) -> Option<ColumnIdx> {
        self.by_id.get(column_id).copied()
    }

    pub fn column(&self, column_id: &str) -> Option<&Column<T>> {
        self.position(column_id).map(|idx| &self.columns[idx.index()])
    }

    pub fn column_at(&self, idx: ColumnIdx) -> &Column<T> {
        &self.columns[idx.index()]
    }

    pub fn is_sortable(&self, column_id: &str) -> bool {
        self.column(column_id).is_some_and(Column::is_sortable)
    }

    pub fn is_filterable(&self, column_id: &str) -> bool {
        self.column(column_id).is_some_and(Column::is_filterable)
    }

    /// Value kind of a column. Always `Some` for sortable/filterable columns.
    pub fn kind(&self, column_id: &str) -> Option<ValueKind> {
        self.column(column_id).and_then(Column::value_kind)
    }

    /// Cached or freshly computed accessor value of `column_id` for `row`.
    pub fn resolve<'r>(&self, row: &'r Row<T>, column_id: &str) -> Option<&'r CellValue> {
        self.position(column_id).map(|idx| self.resolve_at(row, idx))
    }

    pub fn resolve_at<'r>(&self, row: &'r Row<T>, idx: ColumnIdx) -> &'r CellValue {
        row.cell(idx.index(), self.column_at(idx))
    }

    /// Resolve a column id that must be sortable, for building a sort plan.
    pub(crate) fn require_sortable(
        &self,
        column_id: &str,
    ) -> PipelineResult<(ColumnIdx, ValueKind)> {
        let idx = self
            .position(column_id)
            .ok_or_else(|| PipelineError::UnknownColumn(column_id.to_string()))?;
        let column = self.column_at(idx);
        match (column.is_sortable(), column.value_kind()) {
            (true, Some(kind)) => Ok((idx, kind)),
            _ => Err(PipelineError::NotSortable(column_id.to_string())),
        }
    }

    /// Resolve a column id that must be filterable.
    pub(crate) fn require_filterable(
        &self,
        column_id: &str,
    ) -> PipelineResult<(ColumnIdx, ValueKind)> {
        let idx = self
            .position(column_id)
            .ok_or_else(|| PipelineError::UnknownColumn(column_id.to_string()))?;
        let column = self.column_at(idx);
        match (column.is_filterable(), column.value_kind()) {
            (true, Some(kind)) => Ok((idx, kind)),
            _ => Err(PipelineError::NotFilterable(column_id.to_string())),
        }
    }
}
