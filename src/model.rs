use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::domain::{CMDMode, HELP_TEXT, Message, TVConfig, TVError};
use crate::engine::{ColumnDefinition, DataTable, Record, TableAction, Value};
use crate::inputter::{InputResult, Inputter};
use crate::loader::{self, LoadedData};
use crate::request::{Request, RequestId, RequestState};
use crate::settings::{PAGE_SIZE_KEY, SettingsStore};

pub const COLUMN_WIDTH_MARGIN: usize = 2;
pub const MIN_COLUMN_WIDTH: usize = 3;

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    LOADING,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

type LoadResult = (RequestId, Result<LoadedData, TVError>);

pub struct HeaderView {
    pub label: String,
    pub width: usize,
    pub sort_marker: Option<&'static str>,
    pub filter: Option<String>,
}

pub struct RowView {
    pub selected: bool,
    pub cells: Vec<String>,
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub name: String,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub all_visible_selected: bool,
    pub page_info: String,
    pub status_message: Option<String>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub loading: bool,
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    source: Option<PathBuf>,
    name: String,
    table: DataTable,
    prototypes: Vec<Value>,
    request: Request<LoadedData>,
    inbox: Option<Receiver<LoadResult>>,
    cursor_row: usize,
    cursor_column: usize,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    popup_message: Option<String>,
    status_message: String,
    last_status_message_update: Instant,
    settings: Box<dyn SettingsStore>,
    clipboard: Option<Clipboard>,
}

impl Model {
    pub fn init(config: &TVConfig, settings: Box<dyn SettingsStore>) -> Self {
        Self {
            config: config.clone(),
            status: Status::EMPTY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            source: None,
            name: String::new(),
            table: DataTable::empty(config.page_size),
            prototypes: Vec::new(),
            request: Request::new(),
            inbox: None,
            cursor_row: 0,
            cursor_column: 0,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            popup_message: None,
            status_message: "Started tabview!".to_string(),
            last_status_message_update: Instant::now(),
            settings,
            clipboard: None,
        }
    }

    /// Page size precedence: command line, then stored preference, then default.
    pub fn resolve_page_size(
        cli: Option<usize>,
        settings: &dyn SettingsStore,
        default: usize,
    ) -> usize {
        cli.or_else(|| {
            settings
                .get(PAGE_SIZE_KEY)
                .and_then(|v| v.parse::<usize>().ok())
        })
        .filter(|&n| n > 0)
        .unwrap_or(default)
    }

    /// Start loading `path` on a background thread. A load in flight is cancelled.
    pub fn load(&mut self, path: PathBuf) {
        let (id, token) = self.request.start();
        let (tx, rx) = mpsc::channel();
        self.inbox = Some(rx);
        self.source = Some(path.clone());
        self.status = Status::LOADING;
        self.set_status_message(format!("Loading {} ...", path.display()));

        thread::spawn(move || {
            let result = loader::load_data_file(&path);
            if token.is_cancelled() {
                debug!("Load of {:?} was cancelled", path);
                return;
            }
            // The receiver is gone when a newer load replaced it
            let _ = tx.send((id, result));
        });
    }

    fn reload(&mut self) {
        match self.source.clone() {
            Some(path) => self.load(path),
            None => self.set_status_message("Nothing to reload"),
        }
    }

    /// Check for a finished load without blocking.
    pub fn poll_loader(&mut self) {
        let received = match &self.inbox {
            Some(rx) => rx.try_recv().ok(),
            None => None,
        };
        if let Some(result) = received {
            self.finish_load(result);
        }
    }

    /// Block until the load in flight finished or `timeout` passed.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let received = match &self.inbox {
            Some(rx) => match rx.recv_timeout(timeout) {
                Ok(result) => Some(result),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            },
            None => None,
        };
        match received {
            Some(result) => {
                self.finish_load(result);
                true
            }
            None => false,
        }
    }

    fn finish_load(&mut self, (id, result): LoadResult) {
        if !self.request.complete(id, result) {
            return;
        }
        self.inbox = None;
        if let Some(data) = self.request.take() {
            let rows = data.records.len();
            self.show(data);
            self.set_status_message(format!("Loaded {rows} rows"));
        } else if let Some(msg) = self.request.error().map(str::to_string) {
            error!("Loading failed: {msg}");
            self.set_status_message(msg);
            self.status = if self.table.columns().is_empty() {
                Status::EMPTY
            } else {
                Status::READY
            };
        }
    }

    /// Display loaded data. Reloading a file with the same columns keeps the
    /// filters, sort and selection.
    pub fn show(&mut self, data: LoadedData) {
        let same_columns = self.table.columns().len() == data.columns.len()
            && self
                .table
                .columns()
                .iter()
                .zip(data.columns.iter())
                .all(|(a, b)| a.id == b.id);

        if same_columns && !self.table.columns().is_empty() {
            self.table.apply(TableAction::ReplaceRecords(data.records));
        } else {
            let page_size = self.table.state().page.page_size;
            self.table = DataTable::new(data.records, data.columns, page_size);
            self.cursor_column = 0;
        }
        self.prototypes = data.prototypes;
        self.name = data.name;
        self.status = Status::READY;
        self.clamp_cursor();
        info!(
            "Showing {} with {} rows",
            self.name,
            self.table.records().len()
        );
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn request_state(&self) -> &RequestState<LoadedData> {
        self.request.state()
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        self.poll_loader();

        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_row(-1),
                    Message::MoveDown => self.move_row(1),
                    Message::MoveLeft => self.move_column(-1),
                    Message::MoveRight => self.move_column(1),
                    Message::NextPage => self.goto_page(self.current_page() + 1),
                    Message::PrevPage => self.goto_page(self.current_page().saturating_sub(1)),
                    Message::FirstPage => self.goto_page(1),
                    Message::LastPage => self.goto_page(self.table.page().total_pages),
                    Message::CycleSort => self.cycle_sort(),
                    Message::Filter => self.enter_cmd_mode(CMDMode::FilterColumn),
                    Message::ClearFilters => {
                        self.apply(TableAction::ClearFilters);
                        self.set_status_message("Filters cleared");
                    }
                    Message::GoToPage => self.enter_cmd_mode(CMDMode::GoToPage),
                    Message::PageSize => self.enter_cmd_mode(CMDMode::PageSize),
                    Message::ToggleRow => self.toggle_row(),
                    Message::SelectAllVisible => self.apply(TableAction::SelectAllVisible),
                    Message::AddVisible => self.apply(TableAction::AddVisible),
                    Message::ClearSelection => self.apply(TableAction::ClearSelection),
                    Message::CopySelection => {
                        let csv = self.table.export_selected();
                        self.copy_to_clipboard(csv, "selected rows");
                    }
                    Message::CopyVisible => {
                        let csv = self.table.export_visible();
                        self.copy_to_clipboard(csv, "filtered rows");
                    }
                    Message::Reload => self.reload(),
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.close_popup(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::CMDINPUT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!("UI was resized to w:{width}, h:{height}");
        self.clamp_cursor();
    }

    // -------------------- Table interaction ---------------------- //

    fn apply(&mut self, action: TableAction) {
        self.table.apply(action);
        self.clamp_cursor();
    }

    fn current_page(&self) -> usize {
        self.table.state().page.current_page
    }

    fn current_column(&self) -> Option<&ColumnDefinition> {
        self.table.columns().get(self.cursor_column)
    }

    fn goto_page(&mut self, page: usize) {
        self.apply(TableAction::SetPage(page));
        self.cursor_row = 0;
    }

    fn move_row(&mut self, step: isize) {
        let rows = self.table.page().rows.len();
        self.cursor_row = self
            .cursor_row
            .saturating_add_signed(step)
            .min(rows.saturating_sub(1));
    }

    fn move_column(&mut self, step: isize) {
        let columns = self.table.columns().len();
        self.cursor_column = self
            .cursor_column
            .saturating_add_signed(step)
            .min(columns.saturating_sub(1));
    }

    fn clamp_cursor(&mut self) {
        self.move_row(0);
        self.move_column(0);
    }

    fn cycle_sort(&mut self) {
        let Some(column) = self.current_column().map(|c| c.id.clone()) else {
            return;
        };
        self.apply(TableAction::CycleSort(column.clone()));
        let message = match &self.table.state().sort {
            Some(sort) => format!("Sorted by {} {}", sort.key, sort.direction),
            None => "Sorting removed".to_string(),
        };
        self.set_status_message(message);
    }

    fn toggle_row(&mut self) {
        let id = self
            .table
            .page()
            .rows
            .get(self.cursor_row)
            .map(|r| r.id().clone());
        if let Some(id) = id {
            self.apply(TableAction::ToggleRow(id));
        }
    }

    fn copy_to_clipboard(&mut self, content: String, what: &str) {
        let lines = content.lines().count().saturating_sub(1);
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    self.report_clipboard_error(e);
                    return;
                }
            }
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };
        match clipboard.set_text(content) {
            Ok(_) => {
                trace!("Copied {lines} {what} to clipboard.");
                self.set_status_message(format!("Copied {lines} {what}"));
            }
            Err(e) => self.report_clipboard_error(e),
        }
    }

    fn report_clipboard_error(&mut self, e: arboard::Error) {
        let err = TVError::Clipboard(e.to_string());
        error!("{err}");
        self.set_status_message(err.to_string());
    }

    // -------------------- Command line ---------------------- //

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        if mode == CMDMode::FilterColumn
            && let Some(column) = self.current_column()
            && !column.filterable
        {
            let message = format!("Column {} cannot be filtered", column.label);
            self.set_status_message(message);
            return;
        }
        trace!("Entering command mode {:?}", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.clear();

        // Prefill with the active filter so it can be edited
        if mode == CMDMode::FilterColumn
            && let Some(column) = self.current_column()
            && let Some(value) = self.table.state().filters.get(&column.id)
        {
            let current = value.to_string();
            self.input.set(&current);
        }
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {:?}", self.last_input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        let mode = self.cmd_mode.take();

        if self.last_input.canceled {
            return;
        }
        let cmd_input = self.last_input.input.trim().to_string();
        match mode {
            Some(CMDMode::FilterColumn) => self.filter_current_column(&cmd_input),
            Some(CMDMode::GoToPage) => match cmd_input.parse::<usize>() {
                Ok(page) => self.goto_page(page),
                Err(_) => self.set_status_message(format!("Not a page number: {cmd_input}")),
            },
            Some(CMDMode::PageSize) => match cmd_input.parse::<usize>() {
                Ok(size) if size > 0 => self.set_page_size(size),
                _ => self.set_status_message(format!("Not a valid page size: {cmd_input}")),
            },
            None => info!("Cmd mode is none!"),
        }
    }

    fn filter_current_column(&mut self, input: &str) {
        let Some(column) = self.current_column().map(|c| c.id.clone()) else {
            return;
        };
        let value = self
            .prototypes
            .get(self.cursor_column)
            .unwrap_or(&Value::Null)
            .parse_like(input);
        info!("Filter {column} by {value:?}");
        self.apply(TableAction::SetFilter {
            column,
            value,
        });
        self.cursor_row = 0;
        self.set_status_message(format!("{} matching rows", self.table.row_count()));
    }

    fn set_page_size(&mut self, size: usize) {
        self.apply(TableAction::SetPageSize(size));
        self.cursor_row = 0;
        if let Err(e) = self.settings.set(PAGE_SIZE_KEY, &size.to_string()) {
            error!("Could not store page size: {e}");
        }
        self.set_status_message(format!("Page size {size}"));
    }

    // -------------------- Popup ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup_message = Some(HELP_TEXT.to_string());
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.popup_message = None;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- UI data ---------------------- //

    pub fn get_uidata(&self) -> UIData {
        let page = self.table.page();
        let state = self.table.state();
        let columns = self.table.columns();

        let rows: Vec<RowView> = page
            .rows
            .iter()
            .map(|r| RowView {
                selected: state.selection.contains(r.id()),
                cells: columns.iter().map(|c| render_cell(c, r)).collect(),
            })
            .collect();

        let headers = columns
            .iter()
            .enumerate()
            .map(|(cidx, c)| {
                let sort_marker = state
                    .sort
                    .as_ref()
                    .filter(|s| s.key == c.id)
                    .map(|s| s.direction.arrow());
                let content_width = rows
                    .iter()
                    .map(|r| r.cells[cidx].chars().count())
                    .max()
                    .unwrap_or(0);
                let label_width = c.label.chars().count() + usize::from(sort_marker.is_some());
                let width = c.width.map(usize::from).unwrap_or_else(|| {
                    (content_width.max(label_width) + COLUMN_WIDTH_MARGIN)
                        .clamp(MIN_COLUMN_WIDTH, self.config.max_column_width)
                });
                HeaderView {
                    label: c.label.clone(),
                    width,
                    sort_marker,
                    filter: state.filters.get(&c.id).map(|v| v.to_string()),
                }
            })
            .collect();

        let page_info = if page.total_rows == 0 {
            format!(
                "no rows of {} | page 1/1 | selected {}",
                self.table.records().len(),
                state.selection.len()
            )
        } else {
            format!(
                "rows {}-{} of {} | page {}/{} | selected {}",
                page.start_index + 1,
                page.end_index,
                page.total_rows,
                page.current_page,
                page.total_pages,
                state.selection.len()
            )
        };

        let timeout = Duration::from_secs(self.config.status_message_timeout);
        let status_message = (self.last_status_message_update.elapsed() < timeout)
            .then(|| self.status_message.clone());

        UIData {
            name: self.name.clone(),
            headers,
            rows,
            selected_row: self.cursor_row,
            selected_column: self.cursor_column,
            all_visible_selected: self.table.all_visible_selected(),
            page_info,
            status_message,
            show_popup: self.modus == Modus::POPUP,
            popup_message: self.popup_message.clone().unwrap_or_default(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.modus == Modus::CMDINPUT,
            loading: self.request.is_loading(),
        }
    }
}

fn render_cell(column: &ColumnDefinition, record: &Record) -> String {
    match column.value(record) {
        Value::Null => "∅".to_string(),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.1}"),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordId;
    use crate::settings::MemoryStore;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn data(n: i64) -> LoadedData {
        LoadedData {
            name: "people.csv".into(),
            records: (1..=n)
                .map(|i| {
                    Record::new(i)
                        .with("id", i)
                        .with("name", format!("p{i:02}"))
                        .with("age", 20 + i % 3)
                })
                .collect(),
            columns: vec![
                ColumnDefinition::field("id"),
                ColumnDefinition::field("name"),
                ColumnDefinition::field("age"),
            ],
            prototypes: vec![Value::Int(0), Value::Text(String::new()), Value::Int(0)],
        }
    }

    fn model(n: i64, page_size: usize) -> Model {
        let cfg = TVConfig::default().with_page_size(page_size);
        let mut m = Model::init(&cfg, Box::new(MemoryStore::new()));
        m.show(data(n));
        m
    }

    fn send(m: &mut Model, msg: Message) {
        m.update(Some(msg)).unwrap();
    }

    fn type_line(m: &mut Model, s: &str) {
        for c in s.chars() {
            send(m, Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
        send(m, Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn page_size_precedence() {
        let mut store = MemoryStore::new();
        assert_eq!(Model::resolve_page_size(None, &store, 10), 10);
        store.set(PAGE_SIZE_KEY, "25").unwrap();
        assert_eq!(Model::resolve_page_size(None, &store, 10), 25);
        assert_eq!(Model::resolve_page_size(Some(5), &store, 10), 5);
        assert_eq!(Model::resolve_page_size(Some(0), &store, 10), 10);
    }

    #[test]
    fn paging_and_cursor() {
        let mut m = model(7, 3);
        send(&mut m, Message::MoveDown);
        send(&mut m, Message::MoveDown);
        send(&mut m, Message::MoveDown);
        assert_eq!(m.cursor(), (2, 0));

        send(&mut m, Message::LastPage);
        assert_eq!(m.table().state().page.current_page, 3);
        assert_eq!(m.cursor(), (0, 0));
        send(&mut m, Message::NextPage);
        assert_eq!(m.table().state().page.current_page, 3);
        send(&mut m, Message::FirstPage);
        send(&mut m, Message::PrevPage);
        assert_eq!(m.table().state().page.current_page, 1);
    }

    #[test]
    fn filter_prompt_parses_by_column_kind() {
        let mut m = model(9, 10);
        send(&mut m, Message::MoveRight);
        send(&mut m, Message::MoveRight);
        send(&mut m, Message::Filter);
        assert!(m.raw_keyevents());
        type_line(&mut m, "21");
        assert!(!m.raw_keyevents());
        assert_eq!(
            m.table().state().filters.get("age"),
            Some(&Value::Int(21))
        );
        assert_eq!(m.table().row_count(), 3);
    }

    #[test]
    fn escape_leaves_filters_alone() {
        let mut m = model(5, 10);
        send(&mut m, Message::Filter);
        send(&mut m, Message::RawKey(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));
        send(&mut m, Message::RawKey(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!m.raw_keyevents());
        assert!(m.table().state().filters.is_empty());
    }

    #[test]
    fn unfilterable_column_refuses_the_prompt() {
        let mut locked = data(3);
        locked.columns[0] = ColumnDefinition::field("id").filterable(false);
        let mut m = Model::init(&TVConfig::default(), Box::new(MemoryStore::new()));
        m.show(locked);

        send(&mut m, Message::Filter);
        assert!(!m.raw_keyevents());
        assert_eq!(
            m.get_uidata().status_message.as_deref(),
            Some("Column id cannot be filtered")
        );

        send(&mut m, Message::MoveRight);
        send(&mut m, Message::Filter);
        assert!(m.raw_keyevents());
    }

    #[test]
    fn page_size_is_stored() {
        let mut m = model(30, 10);
        send(&mut m, Message::PageSize);
        type_line(&mut m, "4");
        assert_eq!(m.table().state().page.page_size, 4);
        assert_eq!(m.settings.get(PAGE_SIZE_KEY).as_deref(), Some("4"));
        assert_eq!(m.get_uidata().page_info, "rows 1-4 of 30 | page 1/8 | selected 0");
    }

    #[test]
    fn selection_and_sort_show_up_in_uidata() {
        let mut m = model(4, 2);
        send(&mut m, Message::MoveRight);
        send(&mut m, Message::CycleSort);
        send(&mut m, Message::CycleSort);
        send(&mut m, Message::ToggleRow);

        let ui = m.get_uidata();
        assert_eq!(ui.headers[1].sort_marker, Some("↓"));
        assert_eq!(ui.rows[0].cells[1], "p04");
        assert!(ui.rows[0].selected);
        assert!(!ui.all_visible_selected);
        assert!(
            m.table()
                .state()
                .selection
                .contains(&RecordId::Number(4))
        );
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut m = model(1, 10);
        send(&mut m, Message::Help);
        assert!(m.get_uidata().show_popup);
        send(&mut m, Message::MoveDown);
        send(&mut m, Message::Exit);
        assert!(!m.get_uidata().show_popup);
        send(&mut m, Message::Quit);
        assert_eq!(m.status, Status::QUITTING);
    }
}
