use super::error::FormulaError;

/// Built-in formula functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Abs,
    Ceil,
    Floor,
    Round,
    RoundTo,
    Sqrt,
    Log,
    Not,
    Min,
    Max,
    If,
}

/// Name and one-line description of each function, in autocomplete order.
pub const AVAILABLE_FUNCTIONS: &[(&str, &str)] = &[
    ("abs", "Absolute value: abs(x)"),
    ("ceil", "Round up to the nearest integer: ceil(x)"),
    ("floor", "Round down to the nearest integer: floor(x)"),
    ("round", "Round to the nearest integer, or to n decimals: round(x, n)"),
    ("roundTo", "Round to n decimals: roundTo(x, n)"),
    ("sqrt", "Square root: sqrt(x)"),
    ("log", "Natural logarithm, or logarithm in a base: log(x, base)"),
    ("not", "Logical negation: not(x)"),
    ("min", "Smallest of the arguments: min(a, b, ...)"),
    ("max", "Largest of the arguments: max(a, b, ...)"),
    ("if", "Conditional: if(condition, then, else)"),
];

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "abs" => Function::Abs,
            "ceil" => Function::Ceil,
            "floor" => Function::Floor,
            "round" => Function::Round,
            "roundTo" => Function::RoundTo,
            "sqrt" => Function::Sqrt,
            "log" => Function::Log,
            "not" => Function::Not,
            "min" => Function::Min,
            "max" => Function::Max,
            "if" => Function::If,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Ceil => "ceil",
            Function::Floor => "floor",
            Function::Round => "round",
            Function::RoundTo => "roundTo",
            Function::Sqrt => "sqrt",
            Function::Log => "log",
            Function::Not => "not",
            Function::Min => "min",
            Function::Max => "max",
            Function::If => "if",
        }
    }

    /// Minimum and maximum argument count (`None` is unbounded), plus how to say it.
    fn arity(&self) -> (usize, Option<usize>, &'static str) {
        match self {
            Function::Abs | Function::Ceil | Function::Floor | Function::Sqrt | Function::Not => {
                (1, Some(1), "1")
            }
            Function::Round | Function::RoundTo | Function::Log => (1, Some(2), "1 or 2"),
            Function::Min | Function::Max => (1, None, "at least 1"),
            Function::If => (3, Some(3), "3"),
        }
    }

    pub fn check_arity(&self, got: usize) -> Result<(), FormulaError> {
        let (min, max, expected) = self.arity();
        if got < min || max.is_some_and(|max| got > max) {
            return Err(FormulaError::Arity {
                function: self.name(),
                expected,
                got,
            });
        }
        Ok(())
    }
}
