//! Mock construction helpers

use spotview::pipeline::{CellValue, Column, PaginationState, RowModelPipeline, ValueKind};
use spotview::source::{DataSource, PollConfig, Poller, ScriptedSource};
use std::sync::Arc;

/// Minimal record used by the pipeline-level tests
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: f64,
}

pub fn person(name: &str, age: f64) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

pub fn person_columns() -> Vec<Column<Person>> {
    vec![
        Column::new("name", "Name")
            .accessor(|p: &Person| CellValue::from(p.name.as_str()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new("age", "Age")
            .accessor(|p: &Person| CellValue::Number(p.age))
            .kind(ValueKind::Number)
            .sortable()
            .filterable(),
    ]
}

pub fn person_pipeline(page_size: usize) -> RowModelPipeline<Person> {
    RowModelPipeline::new(person_columns(), PaginationState::with_page_size(page_size))
        .expect("person columns are valid")
}

/// Spawn an on-demand poller over a scripted source, keeping a handle to the source
pub fn scripted_poller<T: Clone + Send + Sync + 'static>(
    source: ScriptedSource<T>,
) -> (Arc<ScriptedSource<T>>, Poller<T>) {
    let source = Arc::new(source);
    let dyn_source: Arc<dyn DataSource<T>> = source.clone();
    let poller = Poller::spawn(dyn_source, PollConfig::on_demand()).expect("poller starts");
    (source, poller)
}
