use thiserror::Error;

/// Why a custom column cannot be saved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColumnError {
    #[error("Column name is required")]
    MissingName,
    #[error("Formula is required")]
    MissingFormula,
    #[error("Invalid formula: {0}")]
    InvalidFormula(String),
}
