//! Core row model: the snapshot's entities plus their cached cell values.
//!
//! Stage outputs never copy rows. They are vectors of indices into
//! [`RowModel::rows`], so a snapshot is the only place entities live.

use crate::pipeline::column::{CellValue, Column};
use crate::pipeline::id::Generation;
use std::cell::OnceCell;

static MISSING: CellValue = CellValue::Missing;

/// One entity and the lazily computed accessor result for each column.
pub struct Row<T> {
    entity: T,
    cells: Box<[OnceCell<CellValue>]>,
}

impl<T> Row<T> {
    pub(crate) fn new(entity: T, column_count: usize) -> Self {
        Self {
            entity,
            cells: (0..column_count).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn entity(&self) -> &T {
        &self.entity
    }

    /// Cached value of `column`, running its accessor on first use.
    ///
    /// A position past the row's cell slots reads as missing.
    pub(crate) fn cell(&self, position: usize, column: &Column<T>) -> &CellValue {
        match self.cells.get(position) {
            Some(slot) => slot.get_or_init(|| column.evaluate(&self.entity)),
            None => &MISSING,
        }
    }

    /// Whether the cell at `position` has been computed yet.
    pub fn is_cached(&self, position: usize) -> bool {
        self.cells
            .get(position)
            .is_some_and(|cell| cell.get().is_some())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Row<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row").field("entity", &self.entity).finish()
    }
}

/// The rows of the snapshot currently feeding the pipeline.
pub struct RowModel<T> {
    generation: Generation,
    rows: Vec<Row<T>>,
}

impl<T> RowModel<T> {
    pub fn empty() -> Self {
        Self {
            generation: Generation::ZERO,
            rows: Vec::new(),
        }
    }

    pub fn from_snapshot(entities: Vec<T>, generation: Generation, column_count: usize) -> Self {
        Self {
            generation,
            rows: entities
                .into_iter()
                .map(|entity| Row::new(entity, column_count))
                .collect(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identity ordering `0..len`, the input of the first stage.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }
}
