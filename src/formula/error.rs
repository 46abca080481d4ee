use thiserror::Error;

/// Everything that can go wrong while compiling or evaluating a formula.
///
/// [`FormulaError::UndefinedVariable`] is the soft case: a row simply lacks
/// the metric, and the cell renders blank instead of showing an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("{message} at position {position}")]
    Parse { position: usize, message: String },
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("{0}")]
    Type(String),
}

impl FormulaError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Parse {
            position,
            message: message.into(),
        }
    }

    pub fn is_undefined_variable(&self) -> bool {
        matches!(self, FormulaError::UndefinedVariable(_))
    }
}
