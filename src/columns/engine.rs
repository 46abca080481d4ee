use log::debug;
use serde::Serialize;

use super::{
    error::ColumnError,
    sample::sample_protocol,
    sort::{get_sortable_value, SortKey},
};
use crate::formula::{
    flatten_record, replace_aliases, EvaluationResult, FlatRecord, Formula, FormulaError, Value,
};
use crate::models::{CustomColumnDef, DeterminedFormat, EffectiveFormat, FormatType};
use crate::utils::{format_percent, formatted_num};

// ============================================
// Format Inference
// ============================================

/// Chooses a concrete format for an `auto` column from one sample value.
pub trait FormatHeuristic {
    fn infer(&self, value: &Value) -> DeterminedFormat;
}

/// Booleans are `boolean`, numbers in `[0, 1]` are `percent`, numbers above
/// 1000 in magnitude are `usd`, other numbers are `number`, anything else is
/// `string`.
///
/// A large plain count is indistinguishable from a dollar amount here; users
/// who care pick an explicit format.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeHeuristic;

impl FormatHeuristic for MagnitudeHeuristic {
    fn infer(&self, value: &Value) -> DeterminedFormat {
        match value {
            Value::Bool(_) => DeterminedFormat::Boolean,
            Value::Number(n) if (0.0..=1.0).contains(n) => DeterminedFormat::Percent,
            Value::Number(n) if n.abs() > 1000.0 => DeterminedFormat::Usd,
            Value::Number(_) => DeterminedFormat::Number,
            Value::Text(_) | Value::Blank => DeterminedFormat::String,
        }
    }
}

pub fn infer_format(value: &Value) -> DeterminedFormat {
    MagnitudeHeuristic.infer(value)
}

// ============================================
// Display
// ============================================

/// Renders a value for a table cell. `None` means an empty cell.
///
/// Non-finite numbers are never shown. `auto` picks per number: nonzero
/// values strictly between -1 and 1 render as a percentage, values above 1000
/// in magnitude as USD, the rest (including `0` and `1`) as plain numbers.
pub fn format_value(value: &Value, format: EffectiveFormat) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    if let Value::Number(n) = value {
        if !n.is_finite() {
            return None;
        }
    }

    match (format, value) {
        (EffectiveFormat::Auto, Value::Number(n)) if *n != 0.0 && n.abs() < 1.0 => {
            format_percent(*n)
        }
        (EffectiveFormat::Auto, Value::Number(n)) if n.abs() > 1000.0 => formatted_num(*n, true),
        (EffectiveFormat::Auto, Value::Number(n)) => formatted_num(*n, false),
        (_, Value::Bool(b)) => Some(if *b { "True" } else { "False" }.to_string()),
        (EffectiveFormat::Usd, Value::Number(n)) => formatted_num(*n, true),
        (EffectiveFormat::Number, Value::Number(n)) => formatted_num(*n, false),
        (EffectiveFormat::Percent, Value::Number(n)) => format_percent(*n),
        _ => Some(value.to_string()),
    }
}

/// What a custom cell shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum CellDisplay {
    /// Missing metric; nothing is drawn.
    Empty,
    /// Short error marker; the message belongs in a tooltip.
    Error(String),
    Text(String),
}

impl CellDisplay {
    pub fn render(result: &EvaluationResult, format: EffectiveFormat) -> Self {
        if let Some(error) = &result.error {
            return CellDisplay::Error(error.clone());
        }
        match format_value(&result.value, format) {
            Some(text) => CellDisplay::Text(text),
            None => CellDisplay::Empty,
        }
    }
}

/// One evaluated custom column cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCell {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub display: CellDisplay,
    #[serde(rename = "sortKey")]
    pub sort_key: Option<SortKey>,
}

// ============================================
// Compiled Column
// ============================================

/// A column definition with its formula alias-resolved and parsed once.
#[derive(Debug, Clone)]
pub struct CompiledColumn {
    def: CustomColumnDef,
    formula: Result<Formula, FormulaError>,
}

impl CompiledColumn {
    pub fn new(def: CustomColumnDef) -> Self {
        let resolved = replace_aliases(&def.formula);
        let formula = Formula::parse(&resolved);
        if let Err(e) = &formula {
            debug!("Column {:?} has an invalid formula: {}", def.name, e);
        }
        Self { def, formula }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &CustomColumnDef {
        &self.def
    }

    pub fn format(&self) -> EffectiveFormat {
        self.def.effective_format()
    }

    pub fn evaluate_flat(&self, row: &FlatRecord) -> EvaluationResult {
        match &self.formula {
            Ok(formula) => formula.evaluate_flat(row),
            Err(e) => EvaluationResult {
                value: Value::Text("Err".to_string()),
                error: Some(e.to_string()),
            },
        }
    }

    pub fn evaluate<T: Serialize>(&self, row: &T) -> EvaluationResult {
        self.evaluate_flat(&flatten_record(row))
    }

    pub fn sort_key(&self, result: &EvaluationResult) -> Option<SortKey> {
        get_sortable_value(&result.value, self.format())
    }

    pub fn cell(&self, row: &FlatRecord) -> ColumnCell {
        let result = self.evaluate_flat(row);
        let display = CellDisplay::render(&result, self.format());
        let sort_key = self.sort_key(&result);
        ColumnCell {
            value: result.value,
            error: result.error,
            display,
            sort_key,
        }
    }
}

// ============================================
// Saving
// ============================================

/// Validates a column before it is persisted, with the default heuristic.
pub fn prepare_column_for_save(def: CustomColumnDef) -> Result<CustomColumnDef, ColumnError> {
    prepare_column_for_save_with(def, &MagnitudeHeuristic)
}

/// Validates a column before it is persisted.
///
/// Name and formula are required and the formula must evaluate without error
/// against [`sample_protocol`]. For `auto` columns the sample value fixes
/// `determinedFormat`; a blank sample leaves it unset so the format is still
/// inferred per row.
pub fn prepare_column_for_save_with(
    mut def: CustomColumnDef,
    heuristic: &dyn FormatHeuristic,
) -> Result<CustomColumnDef, ColumnError> {
    def.name = def.name.trim().to_string();
    def.formula = def.formula.trim().to_string();
    if def.name.is_empty() {
        return Err(ColumnError::MissingName);
    }
    if def.formula.is_empty() {
        return Err(ColumnError::MissingFormula);
    }

    let compiled = CompiledColumn::new(def.clone());
    let result = compiled.evaluate(&sample_protocol());
    if let Some(error) = result.error {
        return Err(ColumnError::InvalidFormula(error));
    }

    def.determined_format = match def.format_type {
        FormatType::Auto if !result.value.is_blank() => Some(heuristic.infer(&result.value)),
        _ => None,
    };
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricTotals, ProtocolRecord, TvlBuckets, TvlKind, TvlSnapshot};

    fn aave() -> ProtocolRecord {
        let mut tvl = TvlBuckets::new();
        tvl.insert(TvlKind::Default, TvlSnapshot::new(3342618874.0, 0.0, 0.0, 0.0));
        ProtocolRecord {
            name: "Aave".to_string(),
            tvl: Some(tvl),
            fees: Some(MetricTotals {
                total_24h: Some(13689.0),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_heuristic_boundaries() {
        assert_eq!(infer_format(&Value::Number(0.5)), DeterminedFormat::Percent);
        assert_eq!(infer_format(&Value::Number(1.0)), DeterminedFormat::Percent);
        assert_eq!(infer_format(&Value::Number(0.0)), DeterminedFormat::Percent);
        assert_eq!(infer_format(&Value::Number(1500.0)), DeterminedFormat::Usd);
        assert_eq!(infer_format(&Value::Number(-1500.0)), DeterminedFormat::Usd);
        assert_eq!(infer_format(&Value::Number(42.0)), DeterminedFormat::Number);
        assert_eq!(infer_format(&Value::Number(1000.0)), DeterminedFormat::Number);
        assert_eq!(infer_format(&Value::Bool(true)), DeterminedFormat::Boolean);
        assert_eq!(
            infer_format(&Value::Text("abc".to_string())),
            DeterminedFormat::String
        );
    }

    #[test]
    fn test_fees_over_tvl_end_to_end() {
        let column = CompiledColumn::new(CustomColumnDef::new(
            "Fees/TVL",
            "fees_24h / tvl",
            FormatType::Auto,
        ));
        let result = column.evaluate(&aave());
        let value = result.value.as_number().unwrap();
        assert!((value - 0.0000041).abs() < 1e-7);
        assert_eq!(infer_format(&result.value), DeterminedFormat::Percent);

        let saved = prepare_column_for_save(CustomColumnDef::new(
            "Fees/TVL",
            "fees_24h / tvl",
            FormatType::Auto,
        ))
        .unwrap();
        assert_eq!(saved.determined_format, Some(DeterminedFormat::Percent));

        let column = CompiledColumn::new(saved);
        let cell = column.cell(&flatten_record(&aave()));
        assert_eq!(cell.display, CellDisplay::Text("0%".to_string()));
        assert!(matches!(cell.sort_key, Some(SortKey::Number(_))));
    }

    #[test]
    fn test_cell_rendering() {
        let flat = flatten_record(&aave());

        let missing = CompiledColumn::new(CustomColumnDef::new("x", "revenue_24h", FormatType::Usd));
        let cell = missing.cell(&flat);
        assert_eq!(cell.display, CellDisplay::Empty);
        assert_eq!(cell.sort_key, None);

        let broken = CompiledColumn::new(CustomColumnDef::new("x", "tvl +", FormatType::Usd));
        let cell = broken.cell(&flat);
        assert!(matches!(cell.display, CellDisplay::Error(_)));
        assert_eq!(cell.value, Value::Text("Err".to_string()));

        let usd = CompiledColumn::new(CustomColumnDef::new("x", "tvl", FormatType::Usd));
        assert_eq!(usd.cell(&flat).display, CellDisplay::Text("$3.34b".to_string()));

        let infinite = CompiledColumn::new(CustomColumnDef::new("x", "tvl / 0", FormatType::Usd));
        let cell = infinite.cell(&flat);
        assert_eq!(cell.display, CellDisplay::Empty);
        assert_eq!(cell.sort_key, None);
        assert_eq!(cell.error, None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::Blank, EffectiveFormat::Usd), None);
        assert_eq!(
            format_value(&Value::Number(1234.0), EffectiveFormat::Usd).as_deref(),
            Some("$1,234")
        );
        assert_eq!(
            format_value(&Value::Number(0.25), EffectiveFormat::Percent).as_deref(),
            Some("25.00%")
        );
        assert_eq!(
            format_value(&Value::Number(42.0), EffectiveFormat::Auto).as_deref(),
            Some("42")
        );
        assert_eq!(
            format_value(&Value::Number(0.0), EffectiveFormat::Auto).as_deref(),
            Some("0")
        );
        assert_eq!(
            format_value(&Value::Number(1.0), EffectiveFormat::Auto).as_deref(),
            Some("1")
        );
        assert_eq!(
            format_value(&Value::Number(-0.5), EffectiveFormat::Auto).as_deref(),
            Some("-50.00%")
        );
        assert_eq!(
            format_value(&Value::Number(13_689.0), EffectiveFormat::Auto).as_deref(),
            Some("$13,689")
        );
        assert_eq!(
            format_value(&Value::Text("n/a".to_string()), EffectiveFormat::Auto).as_deref(),
            Some("n/a")
        );
        assert_eq!(
            format_value(&Value::Bool(true), EffectiveFormat::Auto).as_deref(),
            Some("True")
        );
        assert_eq!(
            format_value(&Value::Bool(false), EffectiveFormat::Boolean).as_deref(),
            Some("False")
        );
        assert_eq!(
            format_value(&Value::Text("Dexes".to_string()), EffectiveFormat::Usd).as_deref(),
            Some("Dexes")
        );
        assert_eq!(format_value(&Value::Number(f64::NAN), EffectiveFormat::Percent), None);
    }

    #[test]
    fn test_prepare_column_for_save() {
        assert_eq!(
            prepare_column_for_save(CustomColumnDef::new("  ", "tvl", FormatType::Auto)),
            Err(ColumnError::MissingName)
        );
        assert_eq!(
            prepare_column_for_save(CustomColumnDef::new("A", " ", FormatType::Auto)),
            Err(ColumnError::MissingFormula)
        );
        let err = prepare_column_for_save(CustomColumnDef::new("A", "tvl * (", FormatType::Auto))
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid formula: "));

        let saved =
            prepare_column_for_save(CustomColumnDef::new(" Big ", "tvl", FormatType::Number))
                .unwrap();
        assert_eq!(saved.name, "Big");
        assert_eq!(saved.determined_format, None);

        let saved =
            prepare_column_for_save(CustomColumnDef::new("Flag", "tvl > 0", FormatType::Auto))
                .unwrap();
        assert_eq!(saved.determined_format, Some(DeterminedFormat::Boolean));
    }

    #[test]
    fn test_cached_format_wins_over_runtime_type() {
        let mut def = CustomColumnDef::new("Ratio", "mcap / tvl", FormatType::Auto);
        def.determined_format = Some(DeterminedFormat::Percent);
        let column = CompiledColumn::new(def);
        assert_eq!(column.format(), EffectiveFormat::Percent);
    }
}
