use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Display/sort format chosen by the user for a custom column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Auto,
    Number,
    Usd,
    Percent,
    String,
    Boolean,
}

/// A concrete format, resolved from `auto` once at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeterminedFormat {
    Number,
    Usd,
    Percent,
    String,
    Boolean,
}

/// Format actually used for sorting and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveFormat {
    Auto,
    Number,
    Usd,
    Percent,
    String,
    Boolean,
}

impl EffectiveFormat {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            EffectiveFormat::Number | EffectiveFormat::Usd | EffectiveFormat::Percent
        )
    }
}

impl From<FormatType> for EffectiveFormat {
    fn from(format: FormatType) -> Self {
        match format {
            FormatType::Auto => EffectiveFormat::Auto,
            FormatType::Number => EffectiveFormat::Number,
            FormatType::Usd => EffectiveFormat::Usd,
            FormatType::Percent => EffectiveFormat::Percent,
            FormatType::String => EffectiveFormat::String,
            FormatType::Boolean => EffectiveFormat::Boolean,
        }
    }
}

impl From<DeterminedFormat> for EffectiveFormat {
    fn from(format: DeterminedFormat) -> Self {
        match format {
            DeterminedFormat::Number => EffectiveFormat::Number,
            DeterminedFormat::Usd => EffectiveFormat::Usd,
            DeterminedFormat::Percent => EffectiveFormat::Percent,
            DeterminedFormat::String => EffectiveFormat::String,
            DeterminedFormat::Boolean => EffectiveFormat::Boolean,
        }
    }
}

/// User-authored computed column, persisted outside the engine as JSON.
///
/// Fields this version does not know about are kept in `extra` so a
/// load/save cycle writes back exactly what it read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomColumnDef {
    pub name: String,
    /// Raw formula in alias form, e.g. `fees_24h / tvl`.
    pub formula: String,
    #[serde(default)]
    pub format_type: FormatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub determined_format: Option<DeterminedFormat>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl CustomColumnDef {
    pub fn new(name: impl Into<String>, formula: impl Into<String>, format_type: FormatType) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            format_type,
            determined_format: None,
            extra: Map::new(),
        }
    }

    /// Cached inference wins over the declared type, which keeps `auto`
    /// columns from changing format when row data changes.
    pub fn effective_format(&self) -> EffectiveFormat {
        match self.determined_format {
            Some(determined) => determined.into(),
            None => self.format_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_optional_fields_default() {
        let def: CustomColumnDef =
            serde_json::from_value(json!({ "name": "Ratio", "formula": "fees_24h / tvl" })).unwrap();
        assert_eq!(def.format_type, FormatType::Auto);
        assert_eq!(def.determined_format, None);
        assert_eq!(def.effective_format(), EffectiveFormat::Auto);
    }

    #[test]
    fn test_round_trip_preserves_shape_and_unknown_fields() {
        let raw = json!([
            {
                "name": "Fee yield",
                "formula": "fees_24h / tvl",
                "formatType": "auto",
                "determinedFormat": "percent",
                "displayAs": "auto"
            },
            { "name": "Big", "formula": "tvl > 1000000", "formatType": "boolean" }
        ]);

        let defs: Vec<CustomColumnDef> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(defs[0].effective_format(), EffectiveFormat::Percent);
        assert_eq!(defs[1].effective_format(), EffectiveFormat::Boolean);
        assert_eq!(serde_json::to_value(&defs).unwrap(), raw);
    }
}
