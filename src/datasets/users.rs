//! User management table.

use crate::config::TableConfig;
use crate::datasets::build_pipeline;
use crate::pipeline::{CellValue, Column, PipelineResult, RowModelPipeline, ValueKind};
use crate::types::User;

pub const NAME: &str = "name";
pub const EMAIL: &str = "email";
pub const ROLE: &str = "role";
pub const CREATED_AT: &str = "CreatedAt";
/// Edit/delete buttons; display only.
pub const ACTIONS: &str = "actions";

pub fn columns() -> Vec<Column<User>> {
    vec![
        Column::new(NAME, "Name")
            .accessor(|u: &User| CellValue::from(u.name.as_deref()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(EMAIL, "Email")
            .accessor(|u: &User| CellValue::from(u.email.as_str()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(ROLE, "Role")
            .accessor(|u: &User| CellValue::from(u.role.as_str()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(CREATED_AT, "Created At")
            .accessor(|u: &User| CellValue::Date(u.created_at))
            .kind(ValueKind::Date)
            .sortable()
            .filterable(),
        Column::new(ACTIONS, "Actions"),
    ]
}

pub fn pipeline(config: &TableConfig) -> PipelineResult<RowModelPipeline<User>> {
    build_pipeline(columns(), config)
}
