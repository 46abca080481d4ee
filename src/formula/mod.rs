//! Custom formula language over flattened protocol records.
//!
//! - [`flatten`] - Nested record to `a_b_c` paths
//! - [`aliases`] - Short field names and whole-word alias rewriting
//! - [`lexer`] / [`parser`] - Tokens and typed expression tree
//! - [`functions`] - Built-in function library
//! - [`eval`] - Tree-walking evaluator

pub mod aliases;
pub mod error;
pub mod eval;
pub mod flatten;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use aliases::{replace_aliases, resolve_alias, ALIASES, AVAILABLE_FIELDS};
pub use error::FormulaError;
pub use eval::{evaluate_formula, evaluate_formula_flat, EvaluationResult, Formula, Value};
pub use flatten::{flatten_record, flatten_value, FlatRecord};
pub use functions::{Function, AVAILABLE_FUNCTIONS};
pub use parser::{parse, BinaryOp, Expr, UnaryOp};
