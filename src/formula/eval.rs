use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::{
    error::FormulaError,
    flatten::{flatten_record, FlatRecord},
    functions::Function,
    parser::{parse, BinaryOp, Expr, UnaryOp},
};
use crate::utils::round_to;

/// Result value of a formula.
///
/// `Blank` is what a formula over a missing metric produces; it serializes
/// as `""` so consumers see the same shape as for text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Blank,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Blank => true,
            Value::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion for arithmetic: booleans are 0/1, text is parsed
    /// (empty text is 0, anything unparseable is NaN).
    fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Blank => 0.0,
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Text(text) => !text.is_empty(),
            Value::Blank => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => Ok(()),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Blank => serializer.serialize_str(""),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Number to text the way it reads in a table: integers without a decimal
/// point, `NaN` and `Infinity` spelled out.
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Outcome of evaluating a formula against one row.
///
/// On failure `value` still carries a placeholder: [`Value::Blank`] for a
/// missing field (and no error), `"Err"` for everything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn ok(value: Value) -> Self {
        Self { value, error: None }
    }

    fn from_error(error: FormulaError) -> Self {
        if error.is_undefined_variable() {
            return Self::ok(Value::Blank);
        }
        Self {
            value: Value::Text("Err".to_string()),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A parsed formula, reusable across rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let expr = parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Field paths the formula reads.
    pub fn identifiers(&self) -> Vec<&str> {
        self.expr.fields()
    }

    pub fn evaluate<T: Serialize>(&self, row: &T) -> EvaluationResult {
        self.evaluate_flat(&flatten_record(row))
    }

    pub fn evaluate_flat(&self, row: &FlatRecord) -> EvaluationResult {
        match eval(&self.expr, row) {
            Ok(value) => EvaluationResult::ok(value),
            Err(e) => EvaluationResult::from_error(e),
        }
    }
}

/// Parses and evaluates `formula` against `row` in one go.
///
/// Never fails: parse and evaluation errors come back inside the result.
pub fn evaluate_formula<T: Serialize>(formula: &str, row: &T) -> EvaluationResult {
    evaluate_formula_flat(formula, &flatten_record(row))
}

pub fn evaluate_formula_flat(formula: &str, row: &FlatRecord) -> EvaluationResult {
    match Formula::parse(formula) {
        Ok(compiled) => compiled.evaluate_flat(row),
        Err(e) => {
            debug!("Formula {:?} failed to parse: {}", formula, e);
            EvaluationResult::from_error(e)
        }
    }
}

// ====== Tree walk ======

fn eval(expr: &Expr, row: &FlatRecord) -> Result<Value, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(text) => Ok(Value::Text(text.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Field(name) => lookup(name, row),
        Expr::Unary { op, operand } => {
            let value = eval(operand, row)?;
            Ok(match op {
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
                UnaryOp::Not => Value::Bool(!value.truthy()),
            })
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, row),
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, row)?.truthy() {
                eval(then, row)
            } else {
                eval(otherwise, row)
            }
        }
        Expr::Call { function, args } => eval_call(*function, args, row),
    }
}

fn lookup(name: &str, row: &FlatRecord) -> Result<Value, FormulaError> {
    match row.get(name) {
        None | Some(JsonValue::Null) => Err(FormulaError::UndefinedVariable(name.to_string())),
        Some(JsonValue::Number(n)) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
        Some(JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        Some(JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => Err(FormulaError::Type(format!(
            "{name} is a list and cannot be used in a formula"
        ))),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    row: &FlatRecord,
) -> Result<Value, FormulaError> {
    // Logical operators short-circuit.
    match op {
        BinaryOp::And => {
            let result = eval(lhs, row)?.truthy() && eval(rhs, row)?.truthy();
            return Ok(Value::Bool(result));
        }
        BinaryOp::Or => {
            let result = eval(lhs, row)?.truthy() || eval(rhs, row)?.truthy();
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    let a = eval(lhs, row)?;
    let b = eval(rhs, row)?;

    Ok(match op {
        BinaryOp::Add => match (&a, &b) {
            (Value::Text(_), _) | (_, Value::Text(_)) => Value::Text(format!("{a}{b}")),
            _ => Value::Number(a.to_number() + b.to_number()),
        },
        BinaryOp::Sub => Value::Number(a.to_number() - b.to_number()),
        BinaryOp::Mul => Value::Number(a.to_number() * b.to_number()),
        BinaryOp::Div => Value::Number(a.to_number() / b.to_number()),
        BinaryOp::Rem => Value::Number(a.to_number() % b.to_number()),
        BinaryOp::Pow => Value::Number(a.to_number().powf(b.to_number())),
        BinaryOp::Eq => Value::Bool(strict_eq(&a, &b)),
        BinaryOp::Ne => Value::Bool(!strict_eq(&a, &b)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&a, &b) {
                (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
                _ => a.to_number().partial_cmp(&b.to_number()),
            };
            Value::Bool(match ordering {
                None => false,
                Some(ord) => match op {
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Le => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                },
            })
        }
        BinaryOp::And => Value::Bool(a.truthy() && b.truthy()),
        BinaryOp::Or => Value::Bool(a.truthy() || b.truthy()),
    })
}

fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Blank, Value::Blank) => true,
        _ => false,
    }
}

fn eval_call(function: Function, args: &[Expr], row: &FlatRecord) -> Result<Value, FormulaError> {
    if function == Function::If {
        // Only the chosen branch is evaluated.
        return if eval(&args[0], row)?.truthy() {
            eval(&args[1], row)
        } else {
            eval(&args[2], row)
        };
    }

    let values = args
        .iter()
        .map(|arg| eval(arg, row))
        .collect::<Result<Vec<_>, _>>()?;
    let num = |i: usize| values.get(i).map(Value::to_number);
    let x = num(0).unwrap_or(f64::NAN);

    Ok(match function {
        Function::Abs => Value::Number(x.abs()),
        Function::Ceil => Value::Number(x.ceil()),
        Function::Floor => Value::Number(x.floor()),
        Function::Sqrt => Value::Number(x.sqrt()),
        Function::Round | Function::RoundTo => {
            let decimals = num(1).unwrap_or(0.0);
            Value::Number(round_to(x, decimals as i32))
        }
        Function::Log => match num(1) {
            Some(base) => Value::Number(x.ln() / base.ln()),
            None => Value::Number(x.ln()),
        },
        Function::Not => Value::Bool(!values[0].truthy()),
        Function::Min => Value::Number(fold_nan_aware(&values, f64::min)),
        Function::Max => Value::Number(fold_nan_aware(&values, f64::max)),
        Function::If => {
            if values[0].truthy() {
                values[1].clone()
            } else {
                values[2].clone()
            }
        }
    })
}

/// min/max where any NaN argument makes the result NaN.
fn fold_nan_aware(values: &[Value], pick: fn(f64, f64) -> f64) -> f64 {
    let mut numbers = values.iter().map(Value::to_number);
    let Some(first) = numbers.next() else {
        return f64::NAN;
    };
    numbers.fold(first, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            pick(acc, n)
        }
    })
}
