use std::collections::BTreeMap;

use super::column::{ColumnDefinition, find_column};
use super::record::Record;
use super::value::Value;

/// Column id to filter value. Falsy values mean "no filter on this column".
pub type FilterState = BTreeMap<String, Value>;

/// Keep the records that satisfy every active filter, in their original order.
///
/// Text cells match on a case-insensitive substring of the filter value, all
/// other cells on equality. Filters on unknown or unfilterable columns are
/// ignored.
pub fn filter<'a>(
    records: &'a [Record],
    columns: &[ColumnDefinition],
    filters: &FilterState,
) -> Vec<&'a Record> {
    filter_indices(records, columns, filters)
        .into_iter()
        .map(|idx| &records[idx])
        .collect()
}

/// Same as [`filter`], but returns positions into `records`.
pub fn filter_indices(
    records: &[Record],
    columns: &[ColumnDefinition],
    filters: &FilterState,
) -> Vec<usize> {
    let active: Vec<(&ColumnDefinition, Matcher)> = filters
        .iter()
        .filter(|(_, value)| value.is_truthy())
        .filter_map(|(id, value)| {
            find_column(columns, id)
                .filter(|c| c.filterable)
                .map(|c| (c, Matcher::new(value)))
        })
        .collect();

    if active.is_empty() {
        return (0..records.len()).collect();
    }

    records
        .iter()
        .enumerate()
        .filter(|(_, r)| active.iter().all(|(column, m)| m.matches(&column.value(r))))
        .map(|(idx, _)| idx)
        .collect()
}

struct Matcher<'a> {
    value: &'a Value,
    needle: String,
}

impl<'a> Matcher<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            value,
            needle: value.to_string().to_lowercase(),
        }
    }

    fn matches(&self, cell: &Value) -> bool {
        match cell {
            Value::Text(s) => s.to_lowercase().contains(&self.needle),
            other => other.loosely_equals(self.value),
        }
    }
}
