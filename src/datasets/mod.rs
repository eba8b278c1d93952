//! Column definitions for the admin tables.
//!
//! Each dataset module exposes its `columns()` and a `pipeline()` constructor
//! that applies the table's configured page size and default sort.

pub mod parking_spots;
pub mod users;

use crate::config::TableConfig;
use crate::pipeline::{Column, PipelineResult, RowModelPipeline};

/// Build a pipeline over `columns` in the initial state described by `config`.
pub fn build_pipeline<T>(
    columns: Vec<Column<T>>,
    config: &TableConfig,
) -> PipelineResult<RowModelPipeline<T>> {
    let mut pipeline = RowModelPipeline::new(columns, config.pagination())?;
    if !config.default_sort.is_empty() {
        pipeline.set_sort(config.default_sort.clone())?;
    }
    Ok(pipeline)
}
