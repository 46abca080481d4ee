//! Custom computed table columns.
//!
//! - [`engine`] - Alias resolution, evaluation, format inference and rendering
//! - [`sort`] - Sortable values and falsy-last ordering
//! - [`store`] - Persistence seam for column definitions
//! - [`sample`] - Preview row, autocomplete and unknown-field warnings

pub mod engine;
pub mod error;
pub mod sample;
pub mod sort;
pub mod store;

pub use engine::{
    format_value, infer_format, prepare_column_for_save, prepare_column_for_save_with,
    CellDisplay, ColumnCell, CompiledColumn, FormatHeuristic, MagnitudeHeuristic,
};
pub use error::ColumnError;
pub use sample::{sample_protocol, suggestions, unknown_identifiers, Suggestion, SuggestionKind};
pub use sort::{compare_falsy_last, compare_keys, get_sortable_value, sort_falsy_last, SortKey};
pub use store::{ColumnStore, JsonFileColumnStore, MemoryColumnStore};
