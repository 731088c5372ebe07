use std::fmt;
use std::sync::Arc;

use super::record::Record;
use super::value::Value;

pub type Accessor = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Describes how one table column extracts, sorts and filters its values.
#[derive(Clone)]
pub struct ColumnDefinition {
    pub id: String,
    pub label: String,
    pub accessor: Accessor,
    pub sortable: bool,
    pub filterable: bool,
    pub width: Option<u16>,
}

impl ColumnDefinition {
    pub fn new<F>(id: &str, accessor: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            accessor: Arc::new(accessor),
            sortable: true,
            filterable: true,
            width: None,
        }
    }

    /// A column reading the record field of the same name. Missing fields read as null.
    pub fn field(id: &str) -> Self {
        let name = id.to_string();
        Self::new(id, move |r: &Record| r.get(&name).cloned().unwrap_or(Value::Null))
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn value(&self, record: &Record) -> Value {
        (self.accessor)(record)
    }
}

impl fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

pub fn find_column<'a>(columns: &'a [ColumnDefinition], id: &str) -> Option<&'a ColumnDefinition> {
    columns.iter().find(|c| c.id == id)
}
