//! Row-model pipeline for the admin tables.
//!
//! A snapshot of entities flows through three pure stages, each mapping a
//! list of row indices to a new one:
//!
//! ```text
//! [Snapshot] ──► [RowModel] ──► [Filter] ──► [Sort] ──► [Paginate] ──► page rows
//!                                  ▲            ▲            ▲
//!                              FilterState   SortSpec   PaginationState
//! ```
//!
//! # Design
//!
//! - **Columns resolved once**: `ColumnRegistry` validates ids, accessors
//!   and value kinds at construction; stages never see an invalid column.
//! - **Enum dispatch on kinds**: `ValueKind` selects the comparison and
//!   filter predicate, no per-cell dynamic lookup.
//! - **Index arena**: stage outputs are `Vec<usize>` into the snapshot's
//!   rows, cell values are cached per row in a `OnceCell`.
//! - **Per-stage memoization**: each stage output is keyed by its input
//!   revision and its state slice; `RowModelPipeline` owns all of it.
//! - **Explicit notification**: subscribers get `PipelineEvent`s over
//!   crossbeam channels.

pub mod bridge;
pub mod column;
pub mod error;
pub mod executor;
pub mod id;
pub mod registry;
pub mod row;
pub mod stages;
pub mod state;

pub use bridge::{PipelineEvent, Subscribers};
pub use column::{Accessor, CellValue, Column, ValueKind};
pub use error::{PipelineError, PipelineResult};
pub use executor::{RowModelPipeline, SnapshotOutcome, StageStats};
pub use id::{ColumnIdx, Generation, Revision};
pub use registry::ColumnRegistry;
pub use row::{Row, RowModel};
pub use stages::{page_count, PageWindow};
pub use state::{
    FetchError, FilterState, FilterValue, PaginationState, PipelineState, SortKey, SortSpec,
    ViewState, DEFAULT_PAGE_SIZE,
};
