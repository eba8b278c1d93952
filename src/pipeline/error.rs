//! Pipeline-specific error types.

use crate::pipeline::column::ValueKind;
use thiserror::Error;

/// Errors that can occur within the row-model pipeline.
///
/// The first group is raised while a [`ColumnRegistry`](super::ColumnRegistry)
/// is built and is fatal for that configuration. The second group rejects a
/// single call and leaves the pipeline state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Configuration error: duplicate column id '{0}'")]
    DuplicateColumn(String),

    #[error("Configuration error: column with empty id (header '{0}')")]
    EmptyColumnId(String),

    #[error("Configuration error: column '{0}' is sortable or filterable but has no accessor")]
    MissingAccessor(String),

    #[error("Configuration error: column '{0}' is sortable or filterable but has no value kind")]
    MissingValueKind(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' is not sortable")]
    NotSortable(String),

    #[error("Column '{0}' is not filterable")]
    NotFilterable(String),

    #[error("Column '{0}' appears more than once in the sort specification")]
    DuplicateSortKey(String),

    #[error("Filter for column '{column}' does not fit its {kind} values")]
    FilterKindMismatch { column: String, kind: ValueKind },
}

impl PipelineError {
    /// Whether this error comes from an invalid column configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::DuplicateColumn(_)
                | PipelineError::EmptyColumnId(_)
                | PipelineError::MissingAccessor(_)
                | PipelineError::MissingValueKind(_)
        )
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
