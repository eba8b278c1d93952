//! Pipeline executor. Owns the view state and runs the stages on demand.
//!
//! Every mutating call ends in `commit()`:
//! 1. Re-run the filter stage if (generation, filters) changed.
//! 2. Clamp the page index against the filtered row count.
//! 3. Re-run the sort stage if (filter revision, sort spec) changed.
//! 4. Re-slice the page if (sort revision, pagination) changed.
//! 5. Publish the new view state to subscribers.
//!
//! A stage is skipped when its key is unchanged, so paging never re-filters
//! or re-sorts and a new sort never re-filters.

use crate::pipeline::bridge::{PipelineEvent, Subscribers};
use crate::pipeline::column::{CellValue, Column};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{Generation, Revision};
use crate::pipeline::registry::ColumnRegistry;
use crate::pipeline::row::{Row, RowModel};
use crate::pipeline::stages::{filter, paginate, sort};
use crate::pipeline::state::{
    FetchError, FilterState, FilterValue, PaginationState, PipelineState, SortKey, SortSpec,
    ViewState,
};
use crate::source::FetchOutcome;
use crossbeam_channel::Receiver;
use std::collections::HashSet;

/// How many times each stage actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub filter_runs: u64,
    pub sort_runs: u64,
    pub page_runs: u64,
}

/// Result of offering a snapshot to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied,
    /// A snapshot with this or a newer generation was already applied.
    Stale,
}

/// Memoized output of one stage, tagged with the key it was computed for.
struct StageCache<K> {
    key: Option<K>,
    output: Vec<usize>,
    revision: Revision,
}

impl<K: PartialEq> StageCache<K> {
    fn new() -> Self {
        Self {
            key: None,
            output: Vec::new(),
            revision: Revision::default(),
        }
    }

    fn is_fresh(&self, key: &K) -> bool {
        self.key.as_ref() == Some(key)
    }

    fn store(&mut self, key: K, output: Vec<usize>) {
        self.key = Some(key);
        self.output = output;
        self.revision.bump();
    }
}

/// Filtered, sorted and paginated view over the latest snapshot.
pub struct RowModelPipeline<T> {
    registry: ColumnRegistry<T>,
    model: RowModel<T>,
    state: PipelineState,
    filtered: StageCache<(Generation, FilterState)>,
    sorted: StageCache<(Revision, SortSpec)>,
    page: StageCache<(Revision, PaginationState)>,
    last_fetch_error: Option<FetchError>,
    subscribers: Subscribers,
    stats: StageStats,
}

impl<T> RowModelPipeline<T> {
    /// Build a pipeline over an empty row model.
    ///
    /// Fails if the column configuration is invalid.
    pub fn new(columns: Vec<Column<T>>, pagination: PaginationState) -> PipelineResult<Self> {
        let registry = ColumnRegistry::new(columns)?;
        let mut pipeline = Self {
            registry,
            model: RowModel::empty(),
            state: PipelineState {
                pagination: PaginationState::new(pagination.page_index, pagination.page_size),
                ..Default::default()
            },
            filtered: StageCache::new(),
            sorted: StageCache::new(),
            page: StageCache::new(),
            last_fetch_error: None,
            subscribers: Subscribers::new(),
            stats: StageStats::default(),
        };
        pipeline.recompute();
        Ok(pipeline)
    }

    // ── Filters ──

    /// Set the filter for one column. An empty value clears it.
    pub fn set_filter(&mut self, column_id: &str, value: FilterValue) -> PipelineResult<()> {
        let (_, kind) = self.registry.require_filterable(column_id)?;
        if !value.is_empty() && !value.fits(kind) {
            return Err(PipelineError::FilterKindMismatch {
                column: column_id.to_string(),
                kind,
            });
        }
        if self.state.filters.set(column_id, value) {
            self.commit();
        }
        Ok(())
    }

    /// Remove the filter for one column. Returns whether one was active.
    pub fn clear_filter(&mut self, column_id: &str) -> bool {
        let changed = self.state.filters.remove(column_id);
        if changed {
            self.commit();
        }
        changed
    }

    pub fn clear_filters(&mut self) {
        if self.state.filters.clear() {
            self.commit();
        }
    }

    // ── Sorting ──

    /// Replace the sort specification.
    pub fn set_sort(&mut self, spec: impl Into<SortSpec>) -> PipelineResult<()> {
        let spec = spec.into();
        {
            let mut seen = HashSet::with_capacity(spec.keys().len());
            for key in spec.keys() {
                self.registry.require_sortable(&key.column_id)?;
                if !seen.insert(key.column_id.as_str()) {
                    return Err(PipelineError::DuplicateSortKey(key.column_id.clone()));
                }
            }
        }
        if spec != self.state.sort {
            self.state.sort = spec;
            self.commit();
        }
        Ok(())
    }

    /// Header-click cycle for one column: ascending, descending, unsorted.
    ///
    /// With `multi` the other sort keys are kept and a new key is appended
    /// at the lowest priority. Without it the column becomes the only key.
    pub fn toggle_sort(&mut self, column_id: &str, multi: bool) -> PipelineResult<()> {
        self.registry.require_sortable(column_id)?;

        let mut spec = self.state.sort.clone();
        let keys = spec.keys_mut();
        if !multi {
            keys.retain(|k| k.column_id == column_id);
        }
        match keys.iter().position(|k| k.column_id == column_id) {
            None => keys.push(SortKey::asc(column_id)),
            Some(i) if !keys[i].descending => keys[i].descending = true,
            Some(i) => {
                keys.remove(i);
            }
        }

        self.set_sort(spec)
    }

    // ── Pagination ──

    /// Jump to a page. Out-of-range indices land on the last page.
    pub fn set_page(&mut self, page_index: usize) {
        let last = self.page_count() - 1;
        let target = page_index.min(last);
        if target != page_index {
            tracing::debug!("Page {} out of range, clamped to {}", page_index, target);
        }
        if target != self.state.pagination.page_index {
            self.state.pagination.page_index = target;
            self.commit();
        }
    }

    /// Change the page size. Sizes below 1 are ignored.
    ///
    /// The new page is the one holding the first row of the old page, then
    /// clamped, so a small size edit never jumps back to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size < 1 {
            tracing::warn!("Ignoring page size {}", page_size);
            return;
        }
        let pagination = &mut self.state.pagination;
        if page_size != pagination.page_size {
            let first_row = pagination.page_index.saturating_mul(pagination.page_size);
            pagination.page_index = first_row / page_size;
            pagination.page_size = page_size;
            self.commit();
        }
    }

    pub fn first_page(&mut self) {
        self.set_page(0);
    }

    pub fn previous_page(&mut self) {
        let index = self.state.pagination.page_index;
        self.set_page(index.saturating_sub(1));
    }

    pub fn next_page(&mut self) {
        let index = self.state.pagination.page_index;
        self.set_page(index.saturating_add(1));
    }

    pub fn last_page(&mut self) {
        self.set_page(self.page_count() - 1);
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.state.pagination.page_index + 1 < self.page_count()
    }

    pub fn page_count(&self) -> usize {
        self.state.pagination.page_count(self.filtered.output.len())
    }

    // ── Snapshots ──

    /// Replace the row model with a fetched snapshot.
    ///
    /// Snapshots not newer than the applied one are discarded. View state is
    /// kept; only the page index is re-clamped.
    pub fn apply_snapshot(&mut self, entities: Vec<T>, generation: Generation) -> SnapshotOutcome {
        let latest = self.model.generation();
        if generation <= latest {
            tracing::debug!("Discarding {} snapshot, {} already applied", generation, latest);
            self.subscribers.publish(PipelineEvent::SnapshotDiscarded { generation, latest });
            return SnapshotOutcome::Stale;
        }

        let rows = entities.len();
        self.model = RowModel::from_snapshot(entities, generation, self.registry.len());
        self.last_fetch_error = None;
        tracing::info!("Applied {} snapshot with {} rows", generation, rows);
        self.subscribers.publish(PipelineEvent::SnapshotApplied { generation, rows });
        self.commit();
        SnapshotOutcome::Applied
    }

    /// Record a failed fetch. The current snapshot keeps being served.
    ///
    /// Failures of fetches older than the applied snapshot are ignored.
    pub fn record_fetch_error(&mut self, generation: Generation, message: impl Into<String>) {
        let message = message.into();
        let newer_error = self
            .last_fetch_error
            .as_ref()
            .is_some_and(|e| e.generation > generation);
        if generation <= self.model.generation() || newer_error {
            tracing::debug!("Ignoring stale fetch failure for {}: {}", generation, message);
            return;
        }

        tracing::warn!("Fetch {} failed: {}", generation, message);
        self.last_fetch_error = Some(FetchError {
            generation,
            message: message.clone(),
        });
        self.subscribers.publish(PipelineEvent::FetchFailed { generation, message });
        self.commit();
    }

    /// Route one poller outcome to `apply_snapshot` or `record_fetch_error`.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome<T>) -> Option<SnapshotOutcome> {
        match outcome.result {
            Ok(entities) => Some(self.apply_snapshot(entities, outcome.generation)),
            Err(message) => {
                self.record_fetch_error(outcome.generation, message);
                None
            }
        }
    }

    // ── Reads ──

    /// Entities on the current page, in display order.
    pub fn rows(&self) -> Vec<&T> {
        self.page_rows().map(Row::entity).collect()
    }

    /// Rows on the current page, for cell access through [`Self::cell`].
    pub fn page_rows(&self) -> impl Iterator<Item = &Row<T>> + '_ {
        let rows = self.model.rows();
        self.page.output.iter().map(move |&i| &rows[i])
    }

    /// Every filtered row in sorted order, ignoring pagination.
    pub fn sorted_rows(&self) -> Vec<&T> {
        let rows = self.model.rows();
        self.sorted.output.iter().map(|&i| rows[i].entity()).collect()
    }

    /// Cached accessor value of `column_id` for `row`.
    pub fn cell<'r>(&self, row: &'r Row<T>, column_id: &str) -> Option<&'r CellValue> {
        self.registry.resolve(row, column_id)
    }

    /// Full view state plus derived counts.
    pub fn state(&self) -> ViewState {
        ViewState {
            state: self.state.clone(),
            generation: self.model.generation(),
            total_rows: self.model.len(),
            filtered_rows: self.filtered.output.len(),
            page_count: self.page_count(),
            can_previous_page: self.can_previous_page(),
            can_next_page: self.can_next_page(),
            last_fetch_error: self.last_fetch_error.clone(),
        }
    }

    pub fn pipeline_state(&self) -> &PipelineState {
        &self.state
    }

    pub fn registry(&self) -> &ColumnRegistry<T> {
        &self.registry
    }

    pub fn generation(&self) -> Generation {
        self.model.generation()
    }

    pub fn last_fetch_error(&self) -> Option<&FetchError> {
        self.last_fetch_error.as_ref()
    }

    pub fn stats(&self) -> StageStats {
        self.stats
    }

    /// Receive an event after every effective change.
    pub fn subscribe(&mut self) -> Receiver<PipelineEvent> {
        self.subscribers.subscribe()
    }

    // ── Internals ──

    fn commit(&mut self) {
        self.recompute();
        let view = self.state();
        self.subscribers.publish(PipelineEvent::StateChanged(view));
    }

    fn recompute(&mut self) {
        let filter_key = (self.model.generation(), self.state.filters.clone());
        if !self.filtered.is_fresh(&filter_key) {
            let input = self.model.all_indices();
            let output =
                filter::apply(self.model.rows(), &input, &self.state.filters, &self.registry);
            tracing::debug!(
                "Filter stage: {} of {} rows match {} filter(s)",
                output.len(),
                input.len(),
                self.state.filters.len()
            );
            self.filtered.store(filter_key, output);
            self.stats.filter_runs += 1;
        }

        let before = self.state.pagination.page_index;
        if self.state.pagination.clamp(self.filtered.output.len()) {
            tracing::debug!(
                "Page index clamped from {} to {}",
                before,
                self.state.pagination.page_index
            );
        }

        let sort_key = (self.filtered.revision, self.state.sort.clone());
        if !self.sorted.is_fresh(&sort_key) {
            let output = sort::apply(
                self.model.rows(),
                &self.filtered.output,
                &self.state.sort,
                &self.registry,
            );
            tracing::debug!(
                "Sort stage: {} rows by {} key(s)",
                output.len(),
                self.state.sort.keys().len()
            );
            self.sorted.store(sort_key, output);
            self.stats.sort_runs += 1;
        }

        let page_key = (self.sorted.revision, self.state.pagination);
        if !self.page.is_fresh(&page_key) {
            let window = paginate::apply(&self.sorted.output, &self.state.pagination);
            tracing::trace!(
                "Pagination stage: page {}/{} with {} rows",
                window.page_index + 1,
                window.page_count,
                window.rows.len()
            );
            self.page.store(page_key, window.rows);
            self.stats.page_runs += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::column::ValueKind;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: String,
        age: f64,
    }

    fn person(name: &str, age: f64) -> Person {
        Person {
            name: name.to_string(),
            age,
        }
    }

    fn columns() -> Vec<Column<Person>> {
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
            Column::new("actions", "Actions"),
        ]
    }

    fn pipeline(page_size: usize) -> RowModelPipeline<Person> {
        RowModelPipeline::new(columns(), PaginationState::with_page_size(page_size)).unwrap()
    }

    fn ages(p: &RowModelPipeline<Person>) -> Vec<f64> {
        p.rows().iter().map(|p| p.age).collect()
    }

    #[test]
    fn test_empty_pipeline_state() {
        let p = pipeline(10);
        let view = p.state();
        assert_eq!(view.total_rows, 0);
        assert_eq!(view.page_count, 1);
        assert!(!view.can_next_page);
        assert!(p.rows().is_empty());
    }

    #[test]
    fn test_invalid_columns_fail_construction() {
        let mut cols = columns();
        cols.push(Column::new("age", "Age again"));
        let err = RowModelPipeline::new(cols, PaginationState::default()).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_page_size_is_floored_at_construction() {
        let zero = PaginationState {
            page_index: 0,
            page_size: 0,
        };
        let mut p = RowModelPipeline::new(columns(), zero).unwrap();
        assert_eq!(p.pipeline_state().pagination.page_size, 1);

        p.apply_snapshot(vec![person("a", 1.0), person("b", 2.0)], Generation(1));
        assert_eq!(p.page_count(), 2);
        assert_eq!(ages(&p), vec![1.0]);
    }

    #[test]
    fn test_epoch_millis_range_filters_date_column() {
        struct Reading {
            at_ms: f64,
        }
        let at = Column::new("at", "At")
            .accessor(|r: &Reading| CellValue::Number(r.at_ms))
            .kind(ValueKind::Date)
            .filterable();
        let mut p = RowModelPipeline::new(vec![at], PaginationState::default()).unwrap();
        let readings = [1000.0, 5000.0].map(|at_ms| Reading { at_ms });
        p.apply_snapshot(readings.into(), Generation(1));
        p.set_filter("at", FilterValue::number_range(Some(0.0), Some(2000.0))).unwrap();

        assert_eq!(p.state().filtered_rows, 1);
        assert_eq!(p.rows()[0].at_ms, 1000.0);
    }

    #[test]
    fn test_filter_then_sort_example() {
        let mut p = pipeline(10);
        p.apply_snapshot(
            vec![person("a", 30.0), person("b", 10.0), person("c", 20.0), person("d", f64::NAN)],
            Generation(1),
        );
        p.set_filter("age", FilterValue::number_range(Some(10.0), Some(30.0)))
            .unwrap();
        p.set_sort(vec![SortKey::desc("age")]).unwrap();

        assert_eq!(ages(&p), vec![30.0, 20.0, 10.0]);
        assert_eq!(p.state().filtered_rows, 3);
    }

    #[test]
    fn test_set_filter_rejects_bad_columns() {
        let mut p = pipeline(10);
        assert_eq!(
            p.set_filter("actions", FilterValue::text("x")),
            Err(PipelineError::NotFilterable("actions".to_string()))
        );
        assert!(matches!(
            p.set_filter("age", FilterValue::text("x")),
            Err(PipelineError::FilterKindMismatch { .. })
        ));
        assert!(p.pipeline_state().filters.is_empty());
    }

    #[test]
    fn test_set_sort_rejects_duplicates() {
        let mut p = pipeline(10);
        let spec = vec![SortKey::asc("age"), SortKey::desc("age")];
        assert_eq!(
            p.set_sort(spec),
            Err(PipelineError::DuplicateSortKey("age".to_string()))
        );
        assert!(p.pipeline_state().sort.is_empty());
    }

    #[test]
    fn test_page_size_change_clamps_only_when_needed() {
        let mut p = pipeline(10);
        p.apply_snapshot((0..12).map(|i| person("x", i as f64)).collect(), Generation(1));
        p.set_page(1);
        assert_eq!(ages(&p), vec![10.0, 11.0]);

        p.set_page_size(5);
        assert_eq!(p.state().page_index(), 2);
        assert_eq!(p.state().page_count, 3);
        assert_eq!(ages(&p), vec![10.0, 11.0]);

        p.first_page();
        p.set_page_size(4);
        assert_eq!(p.state().page_index(), 0);

        p.set_page_size(0);
        assert_eq!(p.state().page_size(), 5);
    }

    #[test]
    fn test_set_page_clamps_silently() {
        let mut p = pipeline(5);
        p.apply_snapshot((0..12).map(|i| person("x", i as f64)).collect(), Generation(1));
        p.set_page(99);
        assert_eq!(p.state().page_index(), 2);
        assert!(!p.can_next_page());
        p.previous_page();
        assert_eq!(p.state().page_index(), 1);
        p.first_page();
        assert!(!p.can_previous_page());
        p.last_page();
        assert_eq!(p.state().page_index(), 2);
    }

    #[test]
    fn test_paging_does_not_refilter_or_resort() {
        let mut p = pipeline(2);
        p.apply_snapshot((0..6).map(|i| person("x", i as f64)).collect(), Generation(1));
        p.set_sort(vec![SortKey::desc("age")]).unwrap();
        let before = p.stats();

        p.next_page();
        p.next_page();

        let after = p.stats();
        assert_eq!(after.filter_runs, before.filter_runs);
        assert_eq!(after.sort_runs, before.sort_runs);
        assert_eq!(after.page_runs, before.page_runs + 2);
    }

    #[test]
    fn test_sort_change_does_not_refilter() {
        let mut p = pipeline(10);
        p.apply_snapshot(vec![person("a", 1.0), person("b", 2.0)], Generation(1));
        let before = p.stats();
        p.set_sort(vec![SortKey::asc("name")]).unwrap();
        assert_eq!(p.stats().filter_runs, before.filter_runs);
        assert_eq!(p.stats().sort_runs, before.sort_runs + 1);
    }

    #[test]
    fn test_unchanged_calls_do_nothing() {
        let mut p = pipeline(10);
        p.apply_snapshot(vec![person("a", 1.0)], Generation(1));
        p.set_filter("name", FilterValue::text("a")).unwrap();
        let before = p.stats();
        p.set_filter("name", FilterValue::text("a")).unwrap();
        p.set_page(0);
        p.set_page_size(10);
        assert_eq!(p.stats(), before);
    }

    #[test]
    fn test_stale_snapshot_discarded() {
        let mut p = pipeline(10);
        let applied = p.apply_snapshot(vec![person("new", 2.0)], Generation(2));
        assert_eq!(applied, SnapshotOutcome::Applied);
        let older = p.apply_snapshot(vec![person("old", 1.0)], Generation(1));
        assert_eq!(older, SnapshotOutcome::Stale);
        let repeated = p.apply_snapshot(vec![person("dup", 1.0)], Generation(2));
        assert_eq!(repeated, SnapshotOutcome::Stale);

        assert_eq!(p.generation(), Generation(2));
        assert_eq!(p.rows()[0].name, "new");
    }

    #[test]
    fn test_snapshot_keeps_view_state() {
        let mut p = pipeline(2);
        p.apply_snapshot((0..6).map(|i| person("x", i as f64)).collect(), Generation(1));
        p.set_sort(vec![SortKey::desc("age")]).unwrap();
        p.set_filter("name", FilterValue::text("x")).unwrap();
        p.set_page(2);

        p.apply_snapshot((0..3).map(|i| person("x", i as f64)).collect(), Generation(2));

        let view = p.state();
        assert_eq!(view.state.sort, SortSpec::new(vec![SortKey::desc("age")]));
        assert_eq!(view.state.filters.len(), 1);
        assert_eq!(view.page_size(), 2);
        assert_eq!(view.page_index(), 1);
        assert_eq!(ages(&p), vec![0.0]);
    }

    #[test]
    fn test_fetch_error_keeps_rows_and_clears_on_success() {
        let mut p = pipeline(10);
        p.apply_snapshot(vec![person("a", 1.0)], Generation(1));
        p.record_fetch_error(Generation(2), "timeout");

        assert_eq!(p.rows().len(), 1);
        assert_eq!(p.state().last_fetch_error.unwrap().message, "timeout");

        p.apply_snapshot(vec![person("a", 1.0), person("b", 2.0)], Generation(3));
        assert!(!p.state().has_fetch_error());

        p.record_fetch_error(Generation(2), "late failure");
        assert!(p.last_fetch_error().is_none());
    }

    #[test]
    fn test_toggle_sort_cycle() {
        let mut p = pipeline(10);
        p.toggle_sort("age", false).unwrap();
        assert_eq!(p.pipeline_state().sort.keys(), &[SortKey::asc("age")]);
        p.toggle_sort("age", false).unwrap();
        assert_eq!(p.pipeline_state().sort.keys(), &[SortKey::desc("age")]);
        p.toggle_sort("age", false).unwrap();
        assert!(p.pipeline_state().sort.is_empty());

        p.toggle_sort("age", false).unwrap();
        p.toggle_sort("name", true).unwrap();
        assert_eq!(
            p.pipeline_state().sort.keys(),
            &[SortKey::asc("age"), SortKey::asc("name")]
        );
        p.toggle_sort("name", false).unwrap();
        assert_eq!(p.pipeline_state().sort.keys(), &[SortKey::desc("name")]);
    }

    #[test]
    fn test_events_published() {
        let mut p = pipeline(10);
        let rx = p.subscribe();
        p.apply_snapshot(vec![person("a", 1.0)], Generation(1));
        p.apply_snapshot(vec![person("b", 1.0)], Generation(1));

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], PipelineEvent::SnapshotApplied { rows: 1, .. }));
        assert!(matches!(events[1], PipelineEvent::StateChanged(_)));
        assert!(matches!(events[2], PipelineEvent::SnapshotDiscarded { .. }));
    }

    #[test]
    fn test_cell_access() {
        let mut p = pipeline(10);
        p.apply_snapshot(vec![person("Ada", 36.0)], Generation(1));
        let row = p.page_rows().next().unwrap();
        assert_eq!(p.cell(row, "age"), Some(&CellValue::Number(36.0)));
        assert_eq!(p.cell(row, "actions"), Some(&CellValue::Missing));
    }
}
