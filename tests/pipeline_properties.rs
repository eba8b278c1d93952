//! Property tests for the row-model stages
//!
//! Each property runs over randomly generated snapshots with a mix of valid,
//! missing and NaN values.

use proptest::prelude::*;
use spotview::pipeline::stages::{page_count, sort};
use spotview::pipeline::{
    CellValue, Column, ColumnRegistry, FilterValue, Generation, PaginationState, RowModel,
    RowModelPipeline, SortKey, SortSpec, ValueKind,
};

#[derive(Debug, Clone)]
struct Rec {
    pos: usize,
    group: Option<u8>,
    value: f64,
}

fn columns() -> Vec<Column<Rec>> {
    vec![
        Column::new("group", "Group")
            .accessor(|r: &Rec| CellValue::from(r.group.map(|g| format!("g{}", g))))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new("value", "Value")
            .accessor(|r: &Rec| CellValue::Number(r.value))
            .kind(ValueKind::Number)
            .sortable()
            .filterable(),
    ]
}

fn records() -> impl Strategy<Value = Vec<Rec>> {
    let value = prop_oneof![
        8 => (-50i32..50).prop_map(f64::from),
        1 => Just(f64::NAN),
    ];
    prop::collection::vec((prop::option::weighted(0.8, 0u8..4), value), 0..60).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(pos, (group, value))| Rec { pos, group, value })
                .collect()
        },
    )
}

fn sort_spec() -> impl Strategy<Value = SortSpec> {
    prop_oneof![
        any::<bool>().prop_map(|d| SortSpec::new(vec![key("group", d)])),
        any::<bool>().prop_map(|d| SortSpec::new(vec![key("value", d)])),
        (any::<bool>(), any::<bool>())
            .prop_map(|(a, b)| SortSpec::new(vec![key("group", a), key("value", b)])),
    ]
}

fn key(column: &str, descending: bool) -> SortKey {
    if descending {
        SortKey::desc(column)
    } else {
        SortKey::asc(column)
    }
}

fn pipeline(recs: Vec<Rec>, page_size: usize) -> RowModelPipeline<Rec> {
    let mut p = RowModelPipeline::new(columns(), PaginationState::with_page_size(page_size))
        .expect("columns are valid");
    p.apply_snapshot(recs, Generation(1));
    p
}

fn positions(recs: &[&Rec]) -> Vec<usize> {
    recs.iter().map(|r| r.pos).collect()
}

proptest! {
    #[test]
    fn filter_is_an_exact_order_preserving_subsequence(
        recs in records(),
        min in -60i32..60,
        span in 0i32..80,
    ) {
        let max = min + span;
        let n = recs.len();
        let expected: Vec<usize> = recs
            .iter()
            .filter(|r| !r.value.is_nan() && f64::from(min) <= r.value && r.value <= f64::from(max))
            .map(|r| r.pos)
            .collect();

        let mut p = pipeline(recs, 1000);
        p.set_filter("value", FilterValue::number_range(Some(f64::from(min)), Some(f64::from(max))))
            .unwrap();

        let kept = positions(&p.sorted_rows());
        prop_assert!(kept.len() <= n);
        prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn sort_is_idempotent(recs in records(), spec in sort_spec()) {
        let registry = ColumnRegistry::new(columns()).unwrap();
        let model = RowModel::from_snapshot(recs, Generation(1), registry.len());
        let once = sort::apply(model.rows(), &model.all_indices(), &spec, &registry);
        let twice = sort::apply(model.rows(), &once, &spec, &registry);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sort_is_stable_and_missing_last(recs in records(), descending in any::<bool>()) {
        let mut p = pipeline(recs, 1000);
        p.set_sort(vec![key("group", descending)]).unwrap();
        let sorted = p.sorted_rows();

        // Missing groups form a tail in input order.
        let first_missing = sorted.iter().position(|r| r.group.is_none()).unwrap_or(sorted.len());
        prop_assert!(sorted[first_missing..].iter().all(|r| r.group.is_none()));

        for pair in sorted[..first_missing].windows(2) {
            let (a, b) = (pair[0].group.unwrap(), pair[1].group.unwrap());
            if a == b {
                prop_assert!(pair[0].pos < pair[1].pos);
            } else if descending {
                prop_assert!(a > b);
            } else {
                prop_assert!(a < b);
            }
        }
        prop_assert!(sorted[first_missing..].windows(2).all(|w| w[0].pos < w[1].pos));
    }

    #[test]
    fn pages_concatenate_to_sorted_sequence(
        recs in records(),
        spec in sort_spec(),
        page_size in 1usize..12,
    ) {
        let mut p = pipeline(recs, page_size);
        p.set_sort(spec).unwrap();
        let all = positions(&p.sorted_rows());

        let mut paged = Vec::new();
        for page in 0..p.page_count() {
            p.set_page(page);
            let rows = p.rows();
            prop_assert!(rows.len() <= page_size);
            paged.extend(positions(&rows));
        }
        prop_assert_eq!(paged, all);
    }

    #[test]
    fn page_count_formula(rows in 0usize..5000, size in 1usize..200) {
        let expected = std::cmp::max(1, (rows + size - 1) / size);
        prop_assert_eq!(page_count(rows, size), expected);
        prop_assert_eq!(PaginationState::with_page_size(size).page_count(rows), expected);
    }

    #[test]
    fn malformed_bounds_never_fail(recs in records(), junk in "[%$#xq]{1,8}") {
        let mut p = pipeline(recs, 10);
        p.set_filter("value", FilterValue::range(Some(junk.as_str()), None)).unwrap();
        prop_assert_eq!(p.state().filtered_rows, 0);
        prop_assert_eq!(p.state().page_count, 1);
    }
}
