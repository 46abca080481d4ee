//! Nested record to flat `a_b_c` namespace.

use log::warn;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Flat view of a record: `_`-joined paths to scalars (or untouched arrays).
pub type FlatRecord = FxHashMap<String, JsonValue>;

/// Flattens a JSON object.
///
/// Nested objects are walked and their keys joined with `_`
/// (`tvl.default.tvl` becomes `tvl_default_tvl`). Arrays, strings, numbers,
/// booleans and nulls are stored under their path as-is. A non-object input
/// has no properties and flattens to an empty map.
pub fn flatten_value(value: &JsonValue) -> FlatRecord {
    let mut out = FlatRecord::default();
    if let JsonValue::Object(map) = value {
        for (key, child) in map {
            flatten_into(key.clone(), child, &mut out);
        }
    }
    out
}

fn flatten_into(path: String, value: &JsonValue, out: &mut FlatRecord) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                flatten_into(format!("{path}_{key}"), child, out);
            }
        }
        other => {
            out.insert(path, other.clone());
        }
    }
}

/// Flattens any serializable record through its JSON shape.
///
/// Serialization of the crate's record types cannot fail; should a foreign
/// type fail anyway, the record flattens to nothing and every field reads as
/// undefined.
pub fn flatten_record<T: Serialize>(record: &T) -> FlatRecord {
    match serde_json::to_value(record) {
        Ok(value) => flatten_value(&value),
        Err(e) => {
            warn!("Failed to serialize record for flattening: {}", e);
            FlatRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricTotals, ProtocolRecord, TvlBuckets, TvlKind, TvlSnapshot};
    use serde_json::json;

    #[test]
    fn test_flatten_nested_objects() {
        let flat = flatten_value(&json!({
            "name": "Aave",
            "tvl": { "default": { "tvl": 10.5, "tvlPrevDay": null } },
            "chains": ["Ethereum", "Arbitrum"],
            "strikeTvl": false
        }));

        assert_eq!(flat["name"], json!("Aave"));
        assert_eq!(flat["tvl_default_tvl"], json!(10.5));
        assert_eq!(flat["tvl_default_tvlPrevDay"], JsonValue::Null);
        assert_eq!(flat["chains"], json!(["Ethereum", "Arbitrum"]));
        assert_eq!(flat["strikeTvl"], json!(false));
        assert!(!flat.contains_key("tvl"));
        assert!(!flat.contains_key("tvl_default"));
    }

    #[test]
    fn test_flatten_arrays_are_not_expanded() {
        let flat = flatten_value(&json!({ "a": [{ "b": 1 }] }));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a"], json!([{ "b": 1 }]));
    }

    #[test]
    fn test_flatten_non_object_is_empty() {
        assert!(flatten_value(&json!(42)).is_empty());
        assert!(flatten_value(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_flatten_protocol_record_paths() {
        let mut tvl = TvlBuckets::new();
        tvl.insert(TvlKind::Default, TvlSnapshot::new(100.0, 90.0, 80.0, 70.0));
        tvl.insert(TvlKind::Staking, TvlSnapshot::new(5.0, 5.0, 5.0, 5.0));
        let record = ProtocolRecord {
            name: "Aave".to_string(),
            tvl: Some(tvl),
            fees: Some(MetricTotals {
                total_24h: Some(13689.0),
                ..Default::default()
            }),
            ..Default::default()
        };

        let flat = flatten_record(&record);
        assert_eq!(flat["tvl_default_tvl"], json!(100.0));
        assert_eq!(flat["tvl_default_tvlPrevMonth"], json!(70.0));
        assert_eq!(flat["tvl_staking_tvl"], json!(5.0));
        assert_eq!(flat["fees_total24h"], json!(13689.0));
        assert_eq!(flat["fees_total7d"], JsonValue::Null);
        assert!(!flat.contains_key("revenue_total24h"));
        assert!(!flat.contains_key("fees_pf"));
    }
}
