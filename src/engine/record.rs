use std::collections::BTreeMap;
use std::fmt;

use super::value::Value;

/// Identity of a record. Must be unique within one record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Derive an id from a field value. Only integers and non-empty text qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(RecordId::Number(*i)),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                Some(RecordId::Number(*f as i64))
            }
            Value::Text(s) if !s.is_empty() => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Number(i64::from(n))
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// One row of underlying data.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn from_fields(id: RecordId, fields: BTreeMap<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Builder style setter, mostly used to assemble records in tests.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Shallow merge of `fields` into this record. The id never changes.
    pub fn merge(&mut self, fields: BTreeMap<String, Value>) {
        self.fields.extend(fields);
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}
