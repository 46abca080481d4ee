use std::{fs, path::Path};

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::protocol::{ParentProtocol, ProtocolRecord, TvlKind};

/// One extra TVL category's chart, keyed by date.
pub type ExtraSeries = FxHashMap<i64, f64>;

/// Extra TVL category charts keyed by bucket (staking, doublecounted, dcAndLsOverlap, ...).
pub type ExtraTvlCharts = FxHashMap<TvlKind, ExtraSeries>;

/// Everything fetched for one chain overview, already materialized.
///
/// The fetch layer fills this in; the engine only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    #[serde(default)]
    pub chain: String,
    /// `(date, tvl)` pairs of the headline TVL chart.
    #[serde(default)]
    pub tvl_chart: Vec<(i64, f64)>,
    #[serde(default)]
    pub extra_tvl_charts: ExtraTvlCharts,
    /// Leaf protocol records; children reference parents via `parentProtocol`.
    #[serde(default)]
    pub protocols: Vec<ProtocolRecord>,
    #[serde(default)]
    pub parent_protocols: Vec<ParentProtocol>,
}

impl ChainSnapshot {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_parses_date_keyed_extra_charts() {
        let snapshot: ChainSnapshot = serde_json::from_value(json!({
            "chain": "Ethereum",
            "tvlChart": [[1, 100.0], [2, 110.0]],
            "extraTvlCharts": {
                "staking": { "1": 5.0, "2": 6.0 },
                "dcAndLsOverlap": { "2": 1.0 }
            },
            "protocols": [{ "name": "A" }],
            "parentProtocols": [{ "id": "parent#a", "name": "A Group" }]
        }))
        .unwrap();

        assert_eq!(snapshot.tvl_chart, vec![(1, 100.0), (2, 110.0)]);
        assert_eq!(snapshot.extra_tvl_charts[&TvlKind::Staking][&2], 6.0);
        assert_eq!(snapshot.extra_tvl_charts[&TvlKind::DcAndLsOverlap][&2], 1.0);
        assert_eq!(snapshot.protocols.len(), 1);
        assert_eq!(snapshot.parent_protocols[0].mcap, None);
    }
}
