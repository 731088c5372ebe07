use std::cmp::Ordering;
use std::fmt;

use super::column::{ColumnDefinition, find_column};
use super::record::Record;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn asc(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// Header click cycle: unsorted -> asc -> desc -> unsorted.
    /// A click on another column starts over with asc.
    pub fn cycle(current: Option<&SortState>, column_id: &str) -> Option<SortState> {
        match current {
            Some(s) if s.key == column_id => match s.direction {
                SortDirection::Asc => Some(SortState::desc(column_id)),
                SortDirection::Desc => None,
            },
            _ => Some(SortState::asc(column_id)),
        }
    }
}

/// Stable sort of `rows` by the accessor output of the sort column.
///
/// `Desc` reverses the comparison, so ties keep their input order in both
/// directions. A missing sort state or unknown column leaves `rows` untouched.
pub fn sort<'a>(
    rows: Vec<&'a Record>,
    columns: &[ColumnDefinition],
    sort: Option<&SortState>,
) -> Vec<&'a Record> {
    sort_by_column(rows, columns, sort, |r| *r)
}

/// Stable sort of arbitrary row handles, `record_of` resolves a handle to its record.
pub fn sort_by_column<'r, T, F>(
    rows: Vec<T>,
    columns: &[ColumnDefinition],
    sort: Option<&SortState>,
    record_of: F,
) -> Vec<T>
where
    F: Fn(&T) -> &'r Record,
{
    let Some(state) = sort else {
        return rows;
    };
    let Some(column) = find_column(columns, &state.key) else {
        return rows;
    };

    // Evaluate each accessor once instead of on every comparison
    let keyed: Vec<(Value, T)> = rows
        .into_iter()
        .map(|row| (column.value(record_of(&row)), row))
        .collect();
    let cmp = |a: &(Value, T), b: &(Value, T)| order(a.0.compare(&b.0), state.direction);
    let sorted = merge_sort(keyed, &cmp);
    sorted.into_iter().map(|(_, row)| row).collect()
}

// Mixed kinds compare as equal, which is not a total order. `slice::sort_by` may
// panic on such comparators, a plain merge sort stays stable and never does.
fn merge_sort<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let mut left = merge_sort(items, cmp).into_iter().peekable();
    let mut right = merge_sort(right, cmp).into_iter().peekable();

    let mut out = Vec::with_capacity(left.len() + right.len());
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        // Only a strictly smaller right element may overtake the left one
        let next = if cmp(b, a) == Ordering::Less {
            right.next()
        } else {
            left.next()
        };
        out.extend(next);
    }
    out.extend(left);
    out.extend(right);
    out
}

fn order(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn sorts_by_accessor_output() {
        let records = vec![
            Record::new(1).with("name", "Bob"),
            Record::new(2).with("name", "Amy"),
            Record::new(3).with("name", "Cy"),
        ];
        let columns = vec![ColumnDefinition::field("name")];
        let rows: Vec<&Record> = records.iter().collect();

        let asc = sort(rows.clone(), &columns, Some(&SortState::asc("name")));
        assert_eq!(ids(&asc), ["2", "1", "3"]);
        let desc = sort(rows, &columns, Some(&SortState::desc("name")));
        assert_eq!(ids(&desc), ["3", "1", "2"]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let records = vec![
            Record::new(1).with("team", "b"),
            Record::new(2).with("team", "a"),
            Record::new(3).with("team", "b"),
            Record::new(4).with("team", "a"),
        ];
        let columns = vec![ColumnDefinition::field("team")];
        let rows: Vec<&Record> = records.iter().collect();

        let asc = sort(rows.clone(), &columns, Some(&SortState::asc("team")));
        assert_eq!(ids(&asc), ["2", "4", "1", "3"]);
        let desc = sort(rows, &columns, Some(&SortState::desc("team")));
        assert_eq!(ids(&desc), ["1", "3", "2", "4"]);
    }

    #[test]
    fn unknown_column_and_no_sort_are_noops() {
        let records = vec![Record::new(2).with("x", 2), Record::new(1).with("x", 1)];
        let columns = vec![ColumnDefinition::field("x")];
        let rows: Vec<&Record> = records.iter().collect();

        assert_eq!(ids(&sort(rows.clone(), &columns, None)), ["2", "1"]);
        let unknown = SortState::asc("missing");
        assert_eq!(ids(&sort(rows, &columns, Some(&unknown))), ["2", "1"]);
    }

    #[test]
    fn mixed_kinds_do_not_panic() {
        let records = vec![
            Record::new(1).with("v", "text"),
            Record::new(2).with("v", 5),
            Record::new(3).with("v", Value::Null),
        ];
        let columns = vec![ColumnDefinition::field("v")];
        let rows: Vec<&Record> = records.iter().collect();
        let out = sort(rows, &columns, Some(&SortState::asc("v")));
        assert_eq!(ids(&out), ["1", "2", "3"]);
    }

    #[test]
    fn inconsistent_orderings_stay_stable() {
        // 1 == "a", "a" == 0 but 1 > 0
        let records = vec![
            Record::new(1).with("v", 1),
            Record::new(2).with("v", "a"),
            Record::new(3).with("v", 0),
            Record::new(4).with("v", "b"),
            Record::new(5).with("v", f64::NAN),
        ];
        let columns = vec![ColumnDefinition::field("v")];
        let rows: Vec<&Record> = records.iter().collect();
        let out = sort(rows, &columns, Some(&SortState::desc("v")));
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn cycle_goes_asc_desc_none() {
        let s1 = SortState::cycle(None, "name");
        assert_eq!(s1, Some(SortState::asc("name")));
        let s2 = SortState::cycle(s1.as_ref(), "name");
        assert_eq!(s2, Some(SortState::desc("name")));
        assert_eq!(SortState::cycle(s2.as_ref(), "name"), None);
        assert_eq!(
            SortState::cycle(s2.as_ref(), "age"),
            Some(SortState::asc("age"))
        );
    }
}
