use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tabview::engine::{
    ColumnDefinition, DataTable, FilterState, Record, RecordId, SortState, TableAction, Value,
    filter, paginate, sort,
};

fn people() -> (Vec<Record>, Vec<ColumnDefinition>) {
    let records = vec![
        Record::new(1).with("name", "Bob").with("status", "active"),
        Record::new(2).with("name", "Amy").with("status", "inactive"),
        Record::new(3).with("name", "Cy").with("status", "active"),
    ];
    let columns = vec![
        ColumnDefinition::field("name"),
        ColumnDefinition::field("status"),
    ];
    (records, columns)
}

fn random_records(rng: &mut StdRng, n: usize) -> Vec<Record> {
    const WORDS: [&str; 5] = ["alpha", "Beta", "gamma", "DELTA", "beta-max"];
    (0..n)
        .map(|i| {
            Record::new(i as i64)
                .with("word", WORDS[rng.random_range(0..WORDS.len())])
                .with("bucket", rng.random_range(0..4i64))
                .with("unique", (i as i64 * 7919) % 1009)
        })
        .collect()
}

fn random_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::field("word"),
        ColumnDefinition::field("bucket"),
        ColumnDefinition::field("unique"),
    ]
}

fn ids(rows: &[&Record]) -> Vec<RecordId> {
    rows.iter().map(|r| r.id().clone()).collect()
}

fn position(records: &[Record], r: &Record) -> usize {
    records
        .iter()
        .position(|x| x.id() == r.id())
        .expect("row comes from the input")
}

#[test]
fn filter_sort_paginate_pipeline() {
    let (records, columns) = people();
    let mut filters = FilterState::new();
    filters.insert("status".into(), Value::from("active"));

    // "inactive" contains "active" as a substring
    let filtered = filter(&records, &columns, &filters);
    assert_eq!(ids(&filtered), [1, 2, 3].map(RecordId::Number));

    let mut exact = FilterState::new();
    exact.insert("name".into(), Value::from("b"));
    let filtered = filter(&records, &columns, &exact);
    assert_eq!(ids(&filtered), [1].map(RecordId::Number));

    let only_active: Vec<&Record> = records
        .iter()
        .filter(|r| r.get("status") == Some(&Value::from("active")))
        .collect();
    let sorted = sort(only_active, &columns, Some(&SortState::asc("name")));
    assert_eq!(ids(&sorted), [1, 3].map(RecordId::Number));

    let page = paginate(&sorted, 2, 1);
    assert_eq!(ids(page.items), [RecordId::Number(3)]);
    assert_eq!(page.total_pages, 2);
    assert_eq!((page.start_index, page.end_index), (1, 2));
}

#[test]
fn filter_is_an_order_preserving_subset() {
    let mut rng = StdRng::seed_from_u64(17);
    let columns = random_columns();
    for _ in 0..50 {
        let n = rng.random_range(0..60);
        let records = random_records(&mut rng, n);
        let mut filters = FilterState::new();
        filters.insert("word".into(), Value::from("BET"));
        if rng.random_bool(0.5) {
            filters.insert("bucket".into(), Value::Int(rng.random_range(1..4)));
        }

        let out = filter(&records, &columns, &filters);
        let positions: Vec<usize> = out.iter().map(|r| position(&records, r)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for r in &out {
            let word = r.get("word").and_then(Value::as_text).unwrap_or_default();
            assert!(word.to_lowercase().contains("bet"));
            assert!(std::ptr::eq(*r, &records[position(&records, r)]));
        }
    }
}

#[test]
fn empty_filter_is_identity() {
    let mut rng = StdRng::seed_from_u64(3);
    let records = random_records(&mut rng, 40);
    let out = filter(&records, &random_columns(), &FilterState::new());
    assert_eq!(out.len(), records.len());
    assert!(out.iter().zip(&records).all(|(a, b)| std::ptr::eq(*a, b)));
}

#[test]
fn sort_is_stable_under_ties() {
    let mut rng = StdRng::seed_from_u64(99);
    let columns = random_columns();
    for direction in [SortState::asc("bucket"), SortState::desc("bucket")] {
        let records = random_records(&mut rng, 80);
        let sorted = sort(records.iter().collect(), &columns, Some(&direction));
        for pair in sorted.windows(2) {
            if pair[0].get("bucket") == pair[1].get("bucket") {
                assert!(position(&records, pair[0]) < position(&records, pair[1]));
            }
        }
    }
}

#[test]
fn desc_is_reverse_of_asc_without_ties() {
    let mut rng = StdRng::seed_from_u64(5);
    let columns = random_columns();
    let records = random_records(&mut rng, 100);

    let asc = sort(records.iter().collect(), &columns, Some(&SortState::asc("unique")));
    let desc = sort(asc.clone(), &columns, Some(&SortState::desc("unique")));
    let mut reversed = ids(&asc);
    reversed.reverse();
    assert_eq!(ids(&desc), reversed);
}

#[test]
fn pages_cover_every_row_exactly_once() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..40 {
        let count = rng.random_range(0..50);
        let page_size = rng.random_range(1..9);
        let rows: Vec<usize> = (0..count).collect();

        let total_pages = paginate(&rows, 1, page_size).total_pages;
        let mut seen = Vec::new();
        for p in 1..=total_pages {
            let page = paginate(&rows, p, page_size);
            assert!(page.items.len() <= page_size);
            seen.extend_from_slice(page.items);
        }
        assert_eq!(seen, rows);
        assert!(paginate(&rows, total_pages + 1, page_size).items.is_empty());
    }
}

#[test]
fn filter_and_sort_changes_reset_the_page() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut table = DataTable::new(random_records(&mut rng, 45), random_columns(), 5);

    table.apply(TableAction::SetPage(4));
    table.apply(TableAction::SetSort(Some(SortState::asc("unique"))));
    assert_eq!(table.state().page.current_page, 1);

    table.apply(TableAction::SetPage(3));
    table.apply(TableAction::SetFilter {
        column: "word".into(),
        value: Value::from("a"),
    });
    assert_eq!(table.state().page.current_page, 1);

    table.apply(TableAction::SetPage(2));
    table.apply(TableAction::ClearFilters);
    assert_eq!(table.state().page.current_page, 1);
}

#[test]
fn page_changes_leave_the_row_order_alone() {
    let mut rng = StdRng::seed_from_u64(29);
    let mut table = DataTable::new(random_records(&mut rng, 45), random_columns(), 5);
    table.apply(TableAction::SetSort(Some(SortState::desc("word"))));

    let before: Vec<RecordId> = ids(&table.visible_rows());
    let recomputed = table.recomputations();
    for p in [2, 9, 1, 5] {
        table.apply(TableAction::SetPage(p));
        assert_eq!(table.state().page.current_page, p);
    }
    assert_eq!(ids(&table.visible_rows()), before);
    assert_eq!(table.recomputations(), recomputed);
}

#[test]
fn selection_persists_across_pages() {
    let records: Vec<Record> = (1..=4).map(|i| Record::new(i).with("n", i)).collect();
    let mut table = DataTable::new(records, vec![ColumnDefinition::field("n")], 2);

    table.apply(TableAction::AddVisible);
    table.apply(TableAction::SetPage(2));
    table.apply(TableAction::AddVisible);
    let selected: Vec<RecordId> = table.state().selection.iter().cloned().collect();
    assert_eq!(selected, [1, 2, 3, 4].map(RecordId::Number));

    // Replacing keeps only the page on screen
    table.apply(TableAction::SelectAllVisible);
    let selected: Vec<RecordId> = table.state().selection.iter().cloned().collect();
    assert_eq!(selected, [3, 4].map(RecordId::Number));

    table.apply(TableAction::SetPage(1));
    assert_eq!(table.state().selection.len(), 2);
    assert!(!table.all_visible_selected());
    table.apply(TableAction::ClearSelection);
    assert!(table.state().selection.is_empty());
}

#[test]
fn degraded_inputs_do_not_fail() {
    let (records, columns) = people();
    let mut filters = FilterState::new();
    filters.insert("missing".into(), Value::from("x"));
    assert_eq!(filter(&records, &columns, &filters).len(), 3);

    let rows: Vec<&Record> = records.iter().collect();
    let unsorted = sort(rows, &columns, Some(&SortState::asc("missing")));
    assert_eq!(ids(&unsorted), [1, 2, 3].map(RecordId::Number));

    let page = paginate(&unsorted, 1, 0);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_pages, 3);

    let empty: Vec<Record> = Vec::new();
    let none = filter(&empty, &columns, &filters);
    let page = paginate(&none, 3, 10);
    assert!(page.items.is_empty());
    assert_eq!((page.total_pages, page.start_index, page.end_index), (1, 0, 0));
}
