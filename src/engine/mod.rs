//! Filter, sort and paginate a set of records for display.
//!
//! The pipeline order is fixed: [`filter`] then [`sort`] then [`paginate`].
//! All stages are pure and never fail. Unknown columns, empty inputs and
//! out of range pages degrade to no-ops or empty pages. [`DataTable`] wraps
//! the stages with the interaction rules: filter and sort changes go back to
//! page 1 and page changes reuse the cached row order.

pub mod column;
pub mod export;
pub mod filter;
pub mod paginate;
pub mod record;
pub mod selection;
pub mod sort;
pub mod table;
pub mod value;

pub use column::{Accessor, ColumnDefinition};
pub use export::export_csv;
pub use filter::{FilterState, filter, filter_indices};
pub use paginate::{Page, PageState, paginate, total_pages};
pub use record::{Record, RecordId};
pub use selection::Selection;
pub use sort::{SortDirection, SortState, sort, sort_by_column};
pub use table::{DataTable, PageView, TableAction, TableState};
pub use value::Value;
