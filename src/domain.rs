use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

pub const HELP_TEXT: &str = "\
Navigation
  j / k, Down / Up      move the row cursor
  h / l, Left / Right   move the column cursor
  n / p, PgDn / PgUp    next / previous page
  g / G                 first / last page
  :                     go to page

Table
  s                     cycle sort on the current column (asc, desc, off)
  /                     filter the current column
  c                     clear all filters
  z                     set the page size

Selection
  Space                 toggle the current row
  a                     select exactly the visible page
  A                     add the visible page to the selection
  x                     clear the selection
  y                     copy the selection as CSV
  Y                     copy all filtered rows as CSV

  r                     reload the file
  ?                     this help
  Esc                   close popup / cancel input
  q                     quit";

#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    Clipboard(String),
    Settings(String),
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "I/O error: {e}"),
            TVError::PolarsError(e) => write!(f, "Failed reading data: {e}"),
            TVError::LoadingFailed(msg) => write!(f, "Loading failed: {msg}"),
            TVError::FileNotFound => write!(f, "File not found"),
            TVError::PermissionDenied => write!(f, "Permission denied"),
            TVError::UnknownFileType => write!(f, "Unknown file type"),
            TVError::Clipboard(msg) => write!(f, "Clipboard error: {msg}"),
            TVError::Settings(msg) => write!(f, "Settings error: {msg}"),
        }
    }
}

impl std::error::Error for TVError {}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<PolarsError> for TVError {
    fn from(err: PolarsError) -> Self {
        TVError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub max_column_width: usize,
    pub status_message_timeout: u64,
}

impl Default for TVConfig {
    fn default() -> Self {
        TVConfig {
            event_poll_time: 100,
            page_size: 10,
            max_column_width: 40,
            status_message_timeout: 5,
        }
    }
}

/// Command line input modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    FilterColumn,
    GoToPage,
    PageSize,
}

impl CMDMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            CMDMode::FilterColumn => "Filter: ",
            CMDMode::GoToPage => "Page: ",
            CMDMode::PageSize => "Page size: ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    CycleSort,
    Filter,
    ClearFilters,
    GoToPage,
    PageSize,
    ToggleRow,
    SelectAllVisible,
    AddVisible,
    ClearSelection,
    CopySelection,
    CopyVisible,
    Reload,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
