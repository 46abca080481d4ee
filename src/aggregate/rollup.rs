use std::cmp::Ordering;

use log::debug;
use rustc_hash::FxHashMap;

use crate::models::{
    DexsTotals, MetricTotals, ParentProtocol, ProtocolRecord, TvlBuckets, TvlKind, TvlSnapshot,
};
use crate::utils::{add_present, is_truthy, mcap_to_tvl, slug, AnnualizedRatio};

// ============================================
// TVL
// ============================================

/// Running sum of one bucket across children.
///
/// Previous values are `None` until a child contributes, then either a sum or
/// poisoned to null for good once any child lacks that snapshot.
#[derive(Default)]
struct BucketSum {
    tvl: Option<f64>,
    prev_day: Option<Option<f64>>,
    prev_week: Option<Option<f64>>,
    prev_month: Option<Option<f64>>,
}

impl BucketSum {
    fn add(&mut self, bucket: &TvlSnapshot) {
        self.tvl = match bucket.tvl {
            Some(tvl) => Some(self.tvl.unwrap_or(0.0) + tvl),
            None => self.tvl,
        };
        self.prev_day = add_prev(self.prev_day, bucket.tvl_prev_day);
        self.prev_week = add_prev(self.prev_week, bucket.tvl_prev_week);
        self.prev_month = add_prev(self.prev_month, bucket.tvl_prev_month);
    }

    fn finish(self) -> TvlSnapshot {
        TvlSnapshot {
            tvl: self.tvl,
            tvl_prev_day: self.prev_day.flatten(),
            tvl_prev_week: self.prev_week.flatten(),
            tvl_prev_month: self.prev_month.flatten(),
        }
    }
}

fn add_prev(acc: Option<Option<f64>>, value: Option<f64>) -> Option<Option<f64>> {
    match (acc, value) {
        (Some(None), _) | (_, None) => Some(None),
        (acc, Some(value)) => Some(Some(acc.flatten().unwrap_or(0.0) + value)),
    }
}

/// Sums every bucket across children, then takes `excludeParent` out of
/// `default`. `None` when no child has TVL.
fn merge_tvl(children: &[ProtocolRecord]) -> Option<TvlBuckets> {
    if children.iter().all(|child| child.tvl.is_none()) {
        return None;
    }

    let mut sums: FxHashMap<TvlKind, BucketSum> = FxHashMap::default();
    for buckets in children.iter().filter_map(|child| child.tvl.as_ref()) {
        for (kind, bucket) in buckets {
            sums.entry(kind.clone()).or_default().add(bucket);
        }
    }

    let mut merged: TvlBuckets = sums
        .into_iter()
        .map(|(kind, sum)| (kind, sum.finish()))
        .collect();

    if let Some(exclude) = merged.get(&TvlKind::ExcludeParent).copied() {
        let default = merged.entry(TvlKind::Default).or_default();
        default.tvl = Some(default.tvl.unwrap_or(0.0) - exclude.tvl.unwrap_or(0.0));
        // null previous values mean incomplete history and stay null
        default.tvl_prev_day = default
            .tvl_prev_day
            .map(|v| v - exclude.tvl_prev_day.unwrap_or(0.0));
        default.tvl_prev_week = default
            .tvl_prev_week
            .map(|v| v - exclude.tvl_prev_week.unwrap_or(0.0));
        default.tvl_prev_month = default
            .tvl_prev_month
            .map(|v| v - exclude.tvl_prev_month.unwrap_or(0.0));
    }

    Some(merged)
}

// ============================================
// Flow Metrics
// ============================================

/// Field-wise sum of the children that carry the family; `None` when none do.
/// `pf`/`ps` are never summed.
fn sum_totals<'a>(families: impl Iterator<Item = &'a MetricTotals>) -> Option<MetricTotals> {
    families.fold(None, |acc, totals| {
        let acc: MetricTotals = acc.unwrap_or_default();
        Some(MetricTotals {
            total_24h: add_present(acc.total_24h, totals.total_24h),
            total_7d: add_present(acc.total_7d, totals.total_7d),
            total_30d: add_present(acc.total_30d, totals.total_30d),
            total_1y: add_present(acc.total_1y, totals.total_1y),
            monthly_average_1y: add_present(acc.monthly_average_1y, totals.monthly_average_1y),
            total_all_time: add_present(acc.total_all_time, totals.total_all_time),
            pf: None,
            ps: None,
        })
    })
}

fn sum_dexs<'a>(families: impl Iterator<Item = &'a DexsTotals>) -> Option<DexsTotals> {
    families.fold(None, |acc, dexs| {
        let acc: DexsTotals = acc.unwrap_or_default();
        Some(DexsTotals {
            total_24h: add_present(acc.total_24h, dexs.total_24h),
            total_7d: add_present(acc.total_7d, dexs.total_7d),
            total_all_time: add_present(acc.total_all_time, dexs.total_all_time),
            change_7d_over_7d: add_present(acc.change_7d_over_7d, dexs.change_7d_over_7d),
        })
    })
}

// ============================================
// Rollup
// ============================================

/// Merges a parent's children into one parent row.
///
/// TVL buckets, fees, revenue, holders revenue, DEX volume and emissions are
/// summed across the children that carry them; a family no child carries is
/// left out rather than zeroed. P/F and P/S come from the parent's own market
/// cap through `ratio`. The parent strikes if any child strikes, lists the
/// union of the children's chains, and has no category.
pub fn rollup(
    parent: &ParentProtocol,
    children: Vec<ProtocolRecord>,
    ratio: &dyn AnnualizedRatio,
) -> ProtocolRecord {
    debug!("Rolling up {} children into {}", children.len(), parent.name);

    let tvl = merge_tvl(&children);
    let default = tvl
        .as_ref()
        .and_then(|buckets| buckets.get(&TvlKind::Default))
        .copied();
    let default_tvl = default.and_then(|d| d.tvl);

    let mut fees = sum_totals(children.iter().filter_map(|c| c.fees.as_ref()));
    if let Some(fees) = fees.as_mut() {
        fees.pf = ratio.ratio(parent.mcap, fees.total_30d);
    }
    let mut revenue = sum_totals(children.iter().filter_map(|c| c.revenue.as_ref()));
    if let Some(revenue) = revenue.as_mut() {
        revenue.ps = ratio.ratio(parent.mcap, revenue.total_30d);
    }
    let holders_revenue = sum_totals(children.iter().filter_map(|c| c.holders_revenue.as_ref()));
    let dexs = sum_dexs(children.iter().filter_map(|c| c.dexs.as_ref()));
    let emissions = sum_totals(children.iter().filter_map(|c| c.emissions.as_ref()))
        .or(parent.emissions);

    let mut chains: Vec<String> = Vec::new();
    for chain in children.iter().flat_map(|c| c.chains.iter()) {
        if !chains.contains(chain) {
            chains.push(chain.clone());
        }
    }

    ProtocolRecord {
        id: Some(parent.id.clone()),
        name: parent.name.clone(),
        slug: slug(&parent.name),
        category: None,
        chains,
        tvl_change: default
            .filter(|d| is_truthy(d.tvl))
            .map(|d| d.change()),
        mcap: parent.mcap,
        mcaptvl: mcap_to_tvl(parent.mcap, default_tvl),
        strike_tvl: children.iter().any(|c| c.strike_tvl),
        tvl,
        fees,
        revenue,
        holders_revenue,
        dexs,
        emissions,
        parent_protocol: None,
        deprecated: false,
        child_protocols: Some(children),
    }
}

/// Groups leaf rows under their parents and rolls each group up.
///
/// Rows whose `parentProtocol` names a known parent are grouped; a group with
/// a single child stays ungrouped and the child is listed on its own. Rows
/// without a known parent pass through. The result is ordered by headline
/// TVL, largest first, missing TVL counting as 0.
pub fn group_protocols(
    records: Vec<ProtocolRecord>,
    parents: &[ParentProtocol],
    ratio: &dyn AnnualizedRatio,
) -> Vec<ProtocolRecord> {
    let known: FxHashMap<&str, &ParentProtocol> =
        parents.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut groups: FxHashMap<String, Vec<ProtocolRecord>> = FxHashMap::default();
    let mut out: Vec<ProtocolRecord> = Vec::with_capacity(records.len());
    for record in records {
        match record.parent_protocol.as_deref() {
            Some(parent_id) if known.contains_key(parent_id) => {
                groups.entry(parent_id.to_string()).or_default().push(record);
            }
            _ => out.push(record),
        }
    }

    let mut rolled = 0;
    for parent in parents {
        let Some(mut children) = groups.remove(&parent.id) else {
            continue;
        };
        if children.len() == 1 {
            out.append(&mut children);
        } else {
            out.push(rollup(parent, children, ratio));
            rolled += 1;
        }
    }
    debug!("Grouped {} parents, {} rows total", rolled, out.len());

    out.sort_by(|a, b| {
        let a = a.default_tvl().unwrap_or(0.0);
        let b = b.default_tvl().unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    out
}
