use std::collections::BTreeSet;

use log::debug;

use crate::models::{ProtocolRecord, TvlBuckets, TvlKind, TvlSnapshot};
use crate::utils::{add_or_null, mcap_to_tvl};

/// Applies TVL toggles and bounds to table rows (and their children).
///
/// With no toggle enabled and no bound set, rows come back untouched.
/// Otherwise, for every row:
/// - enabled buckets other than `doublecounted`/`liquidstaking` are added to
///   `default`; a missing value on either side makes the sum missing
/// - `strikeTvl` is cleared once `liquidstaking` or `doublecounted` is on
/// - `tvlChange` and `mcaptvl` are recomputed from the new default
/// - the TVL map collapses to `{default}`, nulls read as 0
/// - rows outside `[min_tvl, max_tvl]` are dropped (missing TVL reads as 0);
///   rows without TVL at all only survive when no bound is set
pub fn apply_row_toggles(
    rows: Vec<ProtocolRecord>,
    enabled: &[TvlKind],
    min_tvl: Option<f64>,
    max_tvl: Option<f64>,
) -> Vec<ProtocolRecord> {
    let enabled: BTreeSet<&TvlKind> = enabled.iter().collect();
    let bounded = min_tvl.is_some() || max_tvl.is_some();
    if enabled.is_empty() && !bounded {
        return rows;
    }

    let toggles = RowToggles {
        enabled,
        min_tvl,
        max_tvl,
    };
    let before = rows.len();
    let out: Vec<ProtocolRecord> = rows
        .into_iter()
        .filter_map(|row| {
            if row.tvl.is_none() {
                return (!bounded).then_some(row);
            }
            toggles.apply(row)
        })
        .collect();
    debug!("Row toggles kept {} of {} rows", out.len(), before);
    out
}

struct RowToggles<'a> {
    enabled: BTreeSet<&'a TvlKind>,
    min_tvl: Option<f64>,
    max_tvl: Option<f64>,
}

impl RowToggles<'_> {
    fn apply(&self, mut row: ProtocolRecord) -> Option<ProtocolRecord> {
        let children = row.child_protocols.take().map(|children| {
            children
                .into_iter()
                .filter_map(|child| self.apply(child))
                .collect()
        });

        let default = self.adjusted_default(&row);
        if !self.in_bounds(default.tvl) {
            return None;
        }

        if self.enabled.contains(&TvlKind::LiquidStaking)
            || self.enabled.contains(&TvlKind::DoubleCounted)
        {
            row.strike_tvl = false;
        }
        row.tvl_change = Some(default.change());
        row.mcaptvl = mcap_to_tvl(row.mcap, default.tvl);
        row.tvl = row.tvl.take().map(|_| {
            let mut collapsed = TvlBuckets::new();
            collapsed.insert(TvlKind::Default, default.coerced());
            collapsed
        });
        row.child_protocols = children;
        Some(row)
    }

    fn adjusted_default(&self, row: &ProtocolRecord) -> TvlSnapshot {
        let mut default = row.default_bucket().copied().unwrap_or_default();
        let Some(buckets) = row.tvl.as_ref() else {
            return default;
        };

        for (kind, bucket) in buckets {
            let addable = kind.is_toggle()
                && self.enabled.contains(kind)
                && *kind != TvlKind::DoubleCounted
                && *kind != TvlKind::LiquidStaking;
            if !addable {
                continue;
            }
            default.tvl = add_or_null(default.tvl, bucket.tvl);
            default.tvl_prev_day = add_or_null(default.tvl_prev_day, bucket.tvl_prev_day);
            default.tvl_prev_week = add_or_null(default.tvl_prev_week, bucket.tvl_prev_week);
            default.tvl_prev_month = add_or_null(default.tvl_prev_month, bucket.tvl_prev_month);
        }
        default
    }

    fn in_bounds(&self, tvl: Option<f64>) -> bool {
        let tvl = tvl.unwrap_or(0.0);
        self.min_tvl.map_or(true, |min| tvl >= min) && self.max_tvl.map_or(true, |max| tvl <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, buckets: &[(TvlKind, TvlSnapshot)]) -> ProtocolRecord {
        ProtocolRecord {
            name: name.to_string(),
            tvl: Some(buckets.iter().cloned().collect()),
            ..Default::default()
        }
    }

    fn flat(value: f64) -> TvlSnapshot {
        TvlSnapshot::new(value, value, value, value)
    }

    #[test]
    fn test_untouched_without_toggles_or_bounds() {
        let rows = vec![row(
            "A",
            &[(TvlKind::Default, flat(10.0)), (TvlKind::Staking, flat(5.0))],
        )];
        assert_eq!(apply_row_toggles(rows.clone(), &[], None, None), rows);
    }

    #[test]
    fn test_enabled_buckets_are_added_except_dc_and_ls() {
        let mut r = row(
            "A",
            &[
                (TvlKind::Default, TvlSnapshot::new(100.0, 50.0, 100.0, 100.0)),
                (TvlKind::Staking, TvlSnapshot::new(10.0, 10.0, 0.0, 0.0)),
                (TvlKind::DoubleCounted, flat(1000.0)),
                (TvlKind::LiquidStaking, flat(1000.0)),
            ],
        );
        r.strike_tvl = true;
        r.mcap = Some(220.0);

        let out = apply_row_toggles(
            vec![r],
            &[TvlKind::Staking, TvlKind::DoubleCounted, TvlKind::LiquidStaking],
            None,
            None,
        );
        let out = &out[0];
        let tvl = out.tvl.as_ref().unwrap();
        assert_eq!(tvl.len(), 1);
        assert_eq!(tvl[&TvlKind::Default], TvlSnapshot::new(110.0, 60.0, 100.0, 100.0));
        assert!(!out.strike_tvl);
        assert_eq!(out.mcaptvl, Some(2.0));
        let change = out.tvl_change.unwrap().change_1d.unwrap();
        assert!((change - 83.333333).abs() < 1e-5);
    }

    #[test]
    fn test_null_propagates_then_coerces_to_zero() {
        let r = row(
            "A",
            &[
                (
                    TvlKind::Default,
                    TvlSnapshot {
                        tvl: Some(100.0),
                        tvl_prev_day: Some(90.0),
                        ..Default::default()
                    },
                ),
                (
                    TvlKind::Pool2,
                    TvlSnapshot {
                        tvl: Some(1.0),
                        tvl_prev_day: None,
                        ..Default::default()
                    },
                ),
            ],
        );
        let out = apply_row_toggles(vec![r], &[TvlKind::Pool2], None, None);
        let default = out[0].default_bucket().unwrap();
        assert_eq!(default.tvl, Some(101.0));
        assert_eq!(default.tvl_prev_day, Some(0.0));
        assert_eq!(out[0].tvl_change.unwrap().change_1d, None);
    }

    #[test]
    fn test_bounds_filter_rows_and_children() {
        let mut parent = row("P", &[(TvlKind::Default, flat(100.0))]);
        parent.child_protocols = Some(vec![
            row("small", &[(TvlKind::Default, flat(5.0))]),
            row("big", &[(TvlKind::Default, flat(95.0))]),
        ]);
        let tiny = row("tiny", &[(TvlKind::Default, flat(1.0))]);
        let no_tvl = ProtocolRecord {
            name: "none".to_string(),
            ..Default::default()
        };

        let out = apply_row_toggles(vec![parent, tiny, no_tvl.clone()], &[], Some(10.0), None);
        assert_eq!(out.len(), 1);
        let children = out[0].child_protocols.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "big");

        let out = apply_row_toggles(vec![no_tvl], &[TvlKind::Staking], None, None);
        assert_eq!(out.len(), 1);
        assert!(out[0].tvl.is_none());
    }

    #[test]
    fn test_max_bound() {
        let rows = vec![
            row("a", &[(TvlKind::Default, flat(10.0))]),
            row("b", &[(TvlKind::Default, flat(1000.0))]),
        ];
        let out = apply_row_toggles(rows, &[], None, Some(100.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "a");
    }
}
