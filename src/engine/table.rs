use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use super::column::{ColumnDefinition, find_column};
use super::export::export_csv;
use super::filter::{FilterState, filter_indices};
use super::paginate::{PageState, paginate, total_pages};
use super::record::{Record, RecordId};
use super::selection::Selection;
use super::sort::{SortState, sort_by_column};
use super::value::Value;

/// Everything a table interaction can change.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    SetFilter { column: String, value: Value },
    ClearFilters,
    SetSort(Option<SortState>),
    CycleSort(String),
    SetPage(usize),
    SetPageSize(usize),
    ToggleRow(RecordId),
    SelectAllVisible,
    AddVisible,
    ClearSelection,
    ReplaceRecords(Vec<Record>),
    UpdateRecord {
        id: RecordId,
        fields: BTreeMap<String, Value>,
    },
}

#[derive(Debug, Default, Clone)]
pub struct TableState {
    pub filters: FilterState,
    pub sort: Option<SortState>,
    pub page: PageState,
    pub selection: Selection,
}

/// The rows of the current page together with the pagination numbers.
#[derive(Debug)]
pub struct PageView<'a> {
    pub rows: Vec<&'a Record>,
    pub current_page: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub total_rows: usize,
}

impl PageView<'_> {
    pub fn ids(&self) -> Vec<&RecordId> {
        self.rows.iter().map(|r| r.id()).collect()
    }
}

/// Records and columns with their filter, sort, page and selection state.
///
/// The filtered and sorted row order is cached. Only filter, sort and record
/// changes invalidate it, moving between pages reuses it.
pub struct DataTable {
    records: Vec<Record>,
    columns: Vec<ColumnDefinition>,
    state: TableState,
    rows: Arc<Vec<usize>>, // Mapping of visible row position to record index
    dirty: bool,
    recomputations: usize,
}

impl DataTable {
    pub fn new(records: Vec<Record>, columns: Vec<ColumnDefinition>, page_size: usize) -> Self {
        let mut table = Self {
            records,
            columns,
            state: TableState {
                page: PageState::new(1, page_size),
                ..TableState::default()
            },
            rows: Arc::new(Vec::new()),
            dirty: true,
            recomputations: 0,
        };
        table.refresh();
        table
    }

    pub fn empty(page_size: usize) -> Self {
        Self::new(Vec::new(), Vec::new(), page_size)
    }

    pub fn apply(&mut self, action: TableAction) {
        trace!("Table action: {:?}", action);
        match action {
            TableAction::SetFilter { column, value } => {
                if find_column(&self.columns, &column).is_some_and(|c| !c.filterable) {
                    trace!("Ignoring filter on column {column}");
                    return;
                }
                if value.is_truthy() {
                    self.state.filters.insert(column, value);
                } else {
                    self.state.filters.remove(&column);
                }
                self.invalidate();
            }
            TableAction::ClearFilters => {
                self.state.filters.clear();
                self.invalidate();
            }
            TableAction::SetSort(sort) => {
                self.state.sort = sort;
                self.invalidate();
            }
            TableAction::CycleSort(column) => {
                let sortable = find_column(&self.columns, &column).is_some_and(|c| c.sortable);
                if sortable {
                    self.state.sort = SortState::cycle(self.state.sort.as_ref(), &column);
                    self.invalidate();
                }
            }
            TableAction::SetPage(page) => {
                self.state.page.current_page = page;
                self.clamp_page();
            }
            TableAction::SetPageSize(size) => {
                self.state.page.page_size = size.max(1);
                self.state.page.reset();
            }
            TableAction::ToggleRow(id) => self.state.selection.toggle_row(&id),
            TableAction::SelectAllVisible => {
                let page = self.page();
                let ids: Vec<RecordId> = page.ids().into_iter().cloned().collect();
                self.state.selection.select_all_visible(&ids);
            }
            TableAction::AddVisible => {
                let page = self.page();
                let ids: Vec<RecordId> = page.ids().into_iter().cloned().collect();
                self.state.selection.add_visible(&ids);
            }
            TableAction::ClearSelection => self.state.selection.clear(),
            TableAction::ReplaceRecords(records) => {
                self.records = records;
                self.dirty = true;
                self.refresh();
                self.clamp_page();
            }
            TableAction::UpdateRecord { id, fields } => {
                if let Some(record) = self.records.iter_mut().find(|r| r.id() == &id) {
                    record.merge(fields);
                    self.dirty = true;
                    self.refresh();
                    self.clamp_page();
                }
            }
        }
    }

    /// Filter or sort changed: recompute the row order and go back to page 1.
    fn invalidate(&mut self) {
        self.dirty = true;
        self.state.page.reset();
        self.refresh();
    }

    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        let filtered = filter_indices(&self.records, &self.columns, &self.state.filters);
        let records = &self.records;
        let sorted = sort_by_column(
            filtered,
            &self.columns,
            self.state.sort.as_ref(),
            |&idx| &records[idx],
        );
        trace!(
            "Recomputed rows: {} of {} records visible",
            sorted.len(),
            self.records.len()
        );
        self.rows = Arc::new(sorted);
        self.dirty = false;
        self.recomputations += 1;
    }

    fn clamp_page(&mut self) {
        let pages = total_pages(self.rows.len(), self.state.page.page_size);
        self.state.page.clamp(pages);
    }

    pub fn page(&self) -> PageView<'_> {
        let page = paginate(
            &self.rows,
            self.state.page.current_page,
            self.state.page.page_size,
        );
        PageView {
            rows: page.items.iter().map(|&idx| &self.records[idx]).collect(),
            current_page: self.state.page.current_page,
            total_pages: page.total_pages,
            start_index: page.start_index,
            end_index: page.end_index,
            total_rows: self.rows.len(),
        }
    }

    /// All rows that pass the filters, in sort order.
    pub fn visible_rows(&self) -> Vec<&Record> {
        self.rows.iter().map(|&idx| &self.records[idx]).collect()
    }

    /// Selected records that still exist, in record order.
    pub fn selected_rows(&self) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| self.state.selection.contains(r.id()))
            .collect()
    }

    pub fn export_visible(&self) -> String {
        export_csv(&self.visible_rows(), &self.columns)
    }

    pub fn export_selected(&self) -> String {
        export_csv(&self.selected_rows(), &self.columns)
    }

    pub fn all_visible_selected(&self) -> bool {
        self.state.selection.all_visible_selected(self.page().ids())
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// How often the filtered and sorted order was rebuilt.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
