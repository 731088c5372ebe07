//! Key/value storage for viewer preferences.
//!
//! The model only sees the [`SettingsStore`] trait, so tests run against
//! [`MemoryStore`] and the binary against a [`FileStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::domain::TVError;

pub const PAGE_SIZE_KEY: &str = "page_size";

pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), TVError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TVError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `key=value` lines in a plain text file. The file is created on first write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Result<Self, TVError> {
        let values = match fs::read_to_string(&path) {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(TVError::IoError(e)),
        };
        debug!("Loaded {} settings from {:?}", values.len(), path);
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<(), TVError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content: String = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TVError> {
        if key.contains('=') || key.contains('\n') || value.contains('\n') {
            return Err(TVError::Settings(format!("Invalid setting {key:?}")));
        }
        trace!("Setting {key}={value}");
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

fn parse(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}
