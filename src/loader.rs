//! Read tabular files into engine records with polars.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::TVError;
use crate::engine::{ColumnDefinition, Record, RecordId, Value};

const ID_COLUMN: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

/// Result of loading one file.
#[derive(Debug)]
pub struct LoadedData {
    pub name: String,
    pub records: Vec<Record>,
    pub columns: Vec<ColumnDefinition>,
    /// One value per column showing its kind, used to parse filter input.
    pub prototypes: Vec<Value>,
}

struct LoadedColumn {
    name: String,
    prototype: Value,
    values: Vec<Value>,
}

/// Expand `~` and environment variables in a user supplied path.
pub fn resolve_path(path: &str) -> Result<PathBuf, TVError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| TVError::LoadingFailed(format!("Cannot expand {path}: {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

pub fn load_data_file(path: &Path) -> Result<LoadedData, TVError> {
    let file_info = get_file_info(path.to_path_buf())?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    // Every column is converted on its own rayon worker.
    let columns: Vec<LoadedColumn> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<_, PolarsError>>()?;

    let records = build_records(&columns, df.height());
    info!(
        "Loading {} rows x {} columns took {}ms",
        records.len(),
        columns.len(),
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(LoadedData {
        name,
        records,
        prototypes: columns.iter().map(|c| c.prototype.clone()).collect(),
        columns: columns
            .iter()
            .map(|c| ColumnDefinition::field(&c.name))
            .collect(),
    })
}

fn build_records(columns: &[LoadedColumn], height: usize) -> Vec<Record> {
    record_ids(columns, height)
        .into_iter()
        .enumerate()
        .map(|(row, id)| {
            let fields: BTreeMap<String, Value> = columns
                .iter()
                .map(|c| (c.name.clone(), c.values[row].clone()))
                .collect();
            Record::from_fields(id, fields)
        })
        .collect()
}

/// Ids from the `id` column if it is a key: usable and distinct in every row.
/// Otherwise every record is numbered by its 1-based row.
fn record_ids(columns: &[LoadedColumn], height: usize) -> Vec<RecordId> {
    let keyed = columns
        .iter()
        .find(|c| c.name == ID_COLUMN)
        .and_then(|c| {
            c.values
                .iter()
                .map(RecordId::from_value)
                .collect::<Option<Vec<_>>>()
        })
        .filter(|ids| ids.iter().collect::<BTreeSet<_>>().len() == ids.len());

    match keyed {
        Some(ids) => ids,
        None => {
            debug!("No unique {ID_COLUMN} column, numbering rows");
            (1..=height as i64).map(RecordId::Number).collect()
        }
    }
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    let (prototype, values) = if is_integer_type(&dtype) {
        let cast = column.cast(&DataType::Int64)?;
        let values = cast.i64()?.into_iter().map(Value::from).collect();
        (Value::Int(0), values)
    } else if is_float_type(&dtype) {
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.f64()?.into_iter().map(Value::from).collect();
        (Value::Float(0.0), values)
    } else if dtype == DataType::Boolean {
        let values = column.bool()?.into_iter().map(Value::from).collect();
        (Value::Bool(false), values)
    } else {
        let cast = column.cast(&DataType::String)?;
        let values = cast
            .str()?
            .into_iter()
            .map(|v| match v {
                Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                None => Value::Null,
            })
            .collect();
        (Value::Text(String::new()), values)
    };

    Ok(LoadedColumn {
        name: col_name.to_string(),
        prototype,
        values,
    })
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
    )
}

fn is_float_type(dtype: &DataType) -> bool {
    // u64 does not fit into i64, keep it numeric as float
    matches!(
        dtype,
        DataType::Float32 | DataType::Float64 | DataType::UInt64
    )
}

pub fn detect_file_type(path: &Path) -> Result<FileType, TVError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TVError::UnknownFileType),
    }
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, TVError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound,
        ErrorKind::PermissionDenied => TVError::PermissionDenied,
        _ => TVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TVError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}
