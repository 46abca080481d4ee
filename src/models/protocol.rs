use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::utils::{is_truthy, mcap_to_tvl, percent_change, AnnualizedRatio};

/// TVL bucket identifier.
///
/// `default` is the headline figure; the others are optional extra categories
/// a user may toggle into it. `excludeParent` and `dcAndLsOverlap` are
/// correction buckets and never toggleable. Unknown keys are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TvlKind {
    Default,
    Staking,
    Borrowed,
    Pool2,
    Vesting,
    Offers,
    DoubleCounted,
    LiquidStaking,
    GovTokens,
    ExcludeParent,
    DcAndLsOverlap,
    Other(String),
}

impl TvlKind {
    /// Buckets a user can toggle into the headline TVL.
    pub const TOGGLES: [TvlKind; 8] = [
        TvlKind::Staking,
        TvlKind::Pool2,
        TvlKind::Borrowed,
        TvlKind::DoubleCounted,
        TvlKind::LiquidStaking,
        TvlKind::Vesting,
        TvlKind::GovTokens,
        TvlKind::Offers,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TvlKind::Default => "default",
            TvlKind::Staking => "staking",
            TvlKind::Borrowed => "borrowed",
            TvlKind::Pool2 => "pool2",
            TvlKind::Vesting => "vesting",
            TvlKind::Offers => "offers",
            TvlKind::DoubleCounted => "doublecounted",
            TvlKind::LiquidStaking => "liquidstaking",
            TvlKind::GovTokens => "govtokens",
            TvlKind::ExcludeParent => "excludeParent",
            TvlKind::DcAndLsOverlap => "dcAndLsOverlap",
            TvlKind::Other(key) => key,
        }
    }

    pub fn is_toggle(&self) -> bool {
        Self::TOGGLES.contains(self)
    }
}

impl From<&str> for TvlKind {
    fn from(key: &str) -> Self {
        match key {
            "default" => TvlKind::Default,
            "staking" => TvlKind::Staking,
            "borrowed" => TvlKind::Borrowed,
            "pool2" => TvlKind::Pool2,
            "vesting" => TvlKind::Vesting,
            "offers" => TvlKind::Offers,
            "doublecounted" => TvlKind::DoubleCounted,
            "liquidstaking" => TvlKind::LiquidStaking,
            "govtokens" => TvlKind::GovTokens,
            "excludeParent" => TvlKind::ExcludeParent,
            "dcAndLsOverlap" => TvlKind::DcAndLsOverlap,
            other => TvlKind::Other(other.to_string()),
        }
    }
}

impl From<String> for TvlKind {
    fn from(key: String) -> Self {
        TvlKind::from(key.as_str())
    }
}

impl From<TvlKind> for String {
    fn from(kind: TvlKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TvlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current TVL of one bucket and its three prior snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TvlSnapshot {
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(rename = "tvlPrevDay", default)]
    pub tvl_prev_day: Option<f64>,
    #[serde(rename = "tvlPrevWeek", default)]
    pub tvl_prev_week: Option<f64>,
    #[serde(rename = "tvlPrevMonth", default)]
    pub tvl_prev_month: Option<f64>,
}

impl TvlSnapshot {
    pub fn new(tvl: f64, prev_day: f64, prev_week: f64, prev_month: f64) -> Self {
        Self {
            tvl: Some(tvl),
            tvl_prev_day: Some(prev_day),
            tvl_prev_week: Some(prev_week),
            tvl_prev_month: Some(prev_month),
        }
    }

    /// Percent change of the current value against each prior snapshot.
    pub fn change(&self) -> TvlChange {
        TvlChange {
            change_1d: percent_change(self.tvl, self.tvl_prev_day),
            change_7d: percent_change(self.tvl, self.tvl_prev_week),
            change_1m: percent_change(self.tvl, self.tvl_prev_month),
        }
    }

    /// The four values with nulls replaced by 0.
    pub fn coerced(&self) -> Self {
        Self {
            tvl: Some(self.tvl.unwrap_or(0.0)),
            tvl_prev_day: Some(self.tvl_prev_day.unwrap_or(0.0)),
            tvl_prev_week: Some(self.tvl_prev_week.unwrap_or(0.0)),
            tvl_prev_month: Some(self.tvl_prev_month.unwrap_or(0.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TvlChange {
    #[serde(rename = "change1d", default)]
    pub change_1d: Option<f64>,
    #[serde(rename = "change7d", default)]
    pub change_7d: Option<f64>,
    #[serde(rename = "change1m", default)]
    pub change_1m: Option<f64>,
}

pub type TvlBuckets = BTreeMap<TvlKind, TvlSnapshot>;

/// Rolling totals of a flow metric family (fees, revenue, holders revenue, emissions).
///
/// `pf` is only carried by fees and `ps` only by revenue; both are derived
/// from market cap and never summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTotals {
    #[serde(rename = "total24h", default)]
    pub total_24h: Option<f64>,
    #[serde(rename = "total7d", default)]
    pub total_7d: Option<f64>,
    #[serde(rename = "total30d", default)]
    pub total_30d: Option<f64>,
    #[serde(rename = "total1y", default)]
    pub total_1y: Option<f64>,
    #[serde(rename = "monthlyAverage1y", default)]
    pub monthly_average_1y: Option<f64>,
    #[serde(rename = "totalAllTime", default)]
    pub total_all_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps: Option<f64>,
}

/// DEX volume totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DexsTotals {
    #[serde(rename = "total24h", default)]
    pub total_24h: Option<f64>,
    #[serde(rename = "total7d", default)]
    pub total_7d: Option<f64>,
    #[serde(rename = "totalAllTime", default)]
    pub total_all_time: Option<f64>,
    #[serde(rename = "change_7dover7d", default)]
    pub change_7d_over_7d: Option<f64>,
}

/// One protocol's metrics, or one chain-scoped slice of them.
///
/// Built once per data refresh. Parents are produced by rolling up their
/// `child_protocols`; children never carry children of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub tvl: Option<TvlBuckets>,
    #[serde(default)]
    pub tvl_change: Option<TvlChange>,
    #[serde(default)]
    pub mcap: Option<f64>,
    #[serde(default)]
    pub mcaptvl: Option<f64>,
    #[serde(default)]
    pub strike_tvl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<MetricTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<MetricTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holders_revenue: Option<MetricTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexs: Option<DexsTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions: Option<MetricTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_protocols: Option<Vec<ProtocolRecord>>,
}

impl ProtocolRecord {
    /// Headline bucket, if the record has TVL at all.
    pub fn default_bucket(&self) -> Option<&TvlSnapshot> {
        self.bucket(&TvlKind::Default)
    }

    pub fn bucket(&self, kind: &TvlKind) -> Option<&TvlSnapshot> {
        self.tvl.as_ref()?.get(kind)
    }

    /// `tvl.default.tvl`.
    pub fn default_tvl(&self) -> Option<f64> {
        self.default_bucket()?.tvl
    }

    pub fn has_bucket(&self, kind: &TvlKind) -> bool {
        self.bucket(kind).is_some()
    }

    pub fn is_bridge(&self) -> bool {
        self.category.as_deref() == Some("Bridge")
    }

    /// Fills in the figures a leaf record derives from its raw metrics:
    /// tvl change, mcap/tvl, P/F and P/S, and the strike flag.
    ///
    /// Bridges carry no TVL of their own in chain tables, so their TVL map is
    /// dropped and they never strike.
    pub fn with_derived_metrics(mut self, ratio: &dyn AnnualizedRatio) -> Self {
        if self.is_bridge() {
            self.tvl = None;
        }

        self.tvl_change = self.default_bucket().and_then(|default| {
            default.tvl.map(|_| default.change())
        });
        self.mcaptvl = mcap_to_tvl(self.mcap, self.default_tvl());
        self.strike_tvl = !self.is_bridge()
            && (self.has_bucket(&TvlKind::LiquidStaking)
                || self.has_bucket(&TvlKind::DoubleCounted));

        let mcap = self.mcap;
        if let Some(fees) = self.fees.as_mut() {
            fees.pf = if is_truthy(mcap) {
                ratio.ratio(mcap, fees.total_30d)
            } else {
                None
            };
        }
        if let Some(revenue) = self.revenue.as_mut() {
            revenue.ps = if is_truthy(mcap) {
                ratio.ratio(mcap, revenue.total_30d)
            } else {
                None
            };
        }

        self
    }
}

/// Identity of a parent protocol whose children are rolled up into one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentProtocol {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mcap: Option<f64>,
    /// Emissions tracked at the parent level, used when no child has any.
    #[serde(default)]
    pub emissions: Option<MetricTotals>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MonthlyAnnualized;
    use serde_json::json;

    fn record_with_buckets(category: Option<&str>, buckets: &[(&str, f64)]) -> ProtocolRecord {
        let mut tvl = TvlBuckets::new();
        for (key, value) in buckets {
            tvl.insert(TvlKind::from(*key), TvlSnapshot::new(*value, *value, *value, *value));
        }
        ProtocolRecord {
            name: "Test".to_string(),
            category: category.map(str::to_string),
            tvl: Some(tvl),
            ..Default::default()
        }
    }

    #[test]
    fn test_tvl_kind_round_trips_known_and_unknown_keys() {
        for kind in TvlKind::TOGGLES {
            assert_eq!(TvlKind::from(kind.as_str()), kind);
        }
        assert_eq!(TvlKind::from("excludeParent"), TvlKind::ExcludeParent);
        assert_eq!(TvlKind::from("treasury"), TvlKind::Other("treasury".to_string()));
        assert!(!TvlKind::ExcludeParent.is_toggle());
        assert!(!TvlKind::DcAndLsOverlap.is_toggle());
        assert!(TvlKind::LiquidStaking.is_toggle());
    }

    #[test]
    fn test_record_deserializes_api_shape() {
        let record: ProtocolRecord = serde_json::from_value(json!({
            "name": "Lido",
            "slug": "lido",
            "category": "Liquid Staking",
            "chains": ["Ethereum"],
            "tvl": {
                "default": { "tvl": 100.0, "tvlPrevDay": 90.0, "tvlPrevWeek": null, "tvlPrevMonth": 50.0 },
                "liquidstaking": { "tvl": 10.0 }
            },
            "fees": { "total24h": 5.0, "total30d": 100.0 },
            "dexs": { "total24h": 1.0, "change_7dover7d": 3.5 }
        }))
        .unwrap();

        assert_eq!(record.default_tvl(), Some(100.0));
        assert_eq!(record.bucket(&TvlKind::Default).unwrap().tvl_prev_week, None);
        assert!(record.has_bucket(&TvlKind::LiquidStaking));
        assert_eq!(record.fees.unwrap().total_24h, Some(5.0));
        assert_eq!(record.dexs.unwrap().change_7d_over_7d, Some(3.5));
        assert!(record.child_protocols.is_none());
    }

    #[test]
    fn test_derived_metrics_for_leaf() {
        let mut record = record_with_buckets(Some("Dexes"), &[("default", 200.0)]);
        record.tvl.as_mut().unwrap().insert(
            TvlKind::Default,
            TvlSnapshot::new(200.0, 100.0, 0.0, 400.0),
        );
        record.mcap = Some(400.0);
        record.fees = Some(MetricTotals {
            total_30d: Some(10.0),
            ..Default::default()
        });

        let record = record.with_derived_metrics(&MonthlyAnnualized);
        let change = record.tvl_change.unwrap();
        assert_eq!(change.change_1d, Some(100.0));
        assert_eq!(change.change_7d, None);
        assert_eq!(change.change_1m, Some(-50.0));
        assert_eq!(record.mcaptvl, Some(2.0));
        assert_eq!(record.fees.unwrap().pf, Some(3.33));
        assert!(!record.strike_tvl);
    }

    #[test]
    fn test_strike_tvl_for_liquid_staking_and_bridges() {
        let lsd = record_with_buckets(None, &[("default", 1.0), ("liquidstaking", 1.0)])
            .with_derived_metrics(&MonthlyAnnualized);
        assert!(lsd.strike_tvl);

        let dc = record_with_buckets(None, &[("default", 1.0), ("doublecounted", 1.0)])
            .with_derived_metrics(&MonthlyAnnualized);
        assert!(dc.strike_tvl);

        let bridge = record_with_buckets(Some("Bridge"), &[("default", 1.0), ("doublecounted", 1.0)])
            .with_derived_metrics(&MonthlyAnnualized);
        assert!(!bridge.strike_tvl);
        assert!(bridge.tvl.is_none());
        assert!(bridge.tvl_change.is_none());
    }
}
