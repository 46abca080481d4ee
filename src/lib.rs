pub mod aggregate;
pub mod columns;
pub mod config;
pub mod formula;
pub mod models;
pub mod table;
pub mod utils;

pub use aggregate::{aggregate, apply_row_toggles, group_protocols, rollup, TvlSummary};
pub use columns::{
    get_sortable_value, prepare_column_for_save, ColumnStore, CompiledColumn, JsonFileColumnStore,
    SortKey,
};
pub use config::Settings;
pub use formula::{evaluate_formula, replace_aliases, EvaluationResult, FormulaError, Value};
pub use models::{ChainSnapshot, CustomColumnDef, ProtocolRecord};
pub use table::{ChainTable, TableRow};
