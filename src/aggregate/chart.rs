//! Headline TVL chart with user-toggled extra categories folded in.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::Serialize;

use crate::models::{ExtraTvlCharts, TvlKind};
use crate::utils::percent_change;

/// Latest value of a chart and how it moved over the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChartSummary {
    #[serde(rename = "totalValueUSD")]
    pub total_value_usd: Option<f64>,
    #[serde(rename = "valueChange24hUSD")]
    pub value_change_24h_usd: Option<f64>,
    #[serde(rename = "change24h")]
    pub change_24h: Option<f64>,
}

impl ChartSummary {
    fn between(current: Option<f64>, previous: Option<f64>) -> Self {
        Self {
            total_value_usd: current,
            value_change_24h_usd: match (current, previous) {
                (Some(current), Some(previous)) => Some(current - previous),
                _ => None,
            },
            change_24h: percent_change(current, previous),
        }
    }
}

/// Adjusted chart plus its summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TvlSummary {
    pub series: Vec<(i64, f64)>,
    #[serde(flatten)]
    pub summary: ChartSummary,
}

/// Value `days_before` samples from the end of the chart.
pub fn prev_value_from_chart(series: &[(i64, f64)], days_before: usize) -> Option<f64> {
    let idx = series.len().checked_sub(1 + days_before)?;
    series.get(idx).map(|(_, value)| *value)
}

/// Summary over the last two samples, whatever their spacing.
pub fn summarize_chart(series: &[(i64, f64)]) -> ChartSummary {
    ChartSummary::between(
        prev_value_from_chart(series, 0),
        prev_value_from_chart(series, 1),
    )
}

/// Summary against the value a full day before the last sample.
///
/// `series` must be sorted by date (unix seconds). When the last sample is
/// more than a day older than `now` the chart is stale and no change is
/// reported. The previous value is the latest sample at least 24h before the
/// last one.
pub fn summarize_chart_at(series: &[(i64, f64)], now: DateTime<Utc>) -> ChartSummary {
    let Some(&(last_date, last_value)) = series.last() else {
        return ChartSummary::default();
    };

    let day = Duration::days(1).num_seconds();
    if now.timestamp() - last_date > day {
        debug!("Chart ends at {last_date}, more than a day before {now}");
        return ChartSummary {
            total_value_usd: Some(last_value),
            ..Default::default()
        };
    }

    let previous = series
        .iter()
        .rev()
        .find(|(date, _)| *date <= last_date - day)
        .map(|(_, value)| *value);
    ChartSummary::between(Some(last_value), previous)
}

/// Folds the enabled extra TVL series into the base chart.
///
/// With nothing enabled the base chart is returned as-is. Otherwise every
/// base date gets the enabled series' values for that date added (a missing
/// sample counts as 0), and when both `liquidstaking` and `doublecounted` are
/// on, `dcAndLsOverlap` is subtracted so the shared amount is only counted
/// once. The result is sorted by date.
pub fn aggregate(
    base: &[(i64, f64)],
    extras: &ExtraTvlCharts,
    enabled: &[TvlKind],
) -> TvlSummary {
    let enabled: BTreeSet<&TvlKind> = enabled.iter().collect();
    if enabled.is_empty() {
        return TvlSummary {
            series: base.to_vec(),
            summary: summarize_chart(base),
        };
    }
    debug!("Aggregating TVL chart with {:?}", enabled);

    let mut store: BTreeMap<i64, f64> = BTreeMap::new();
    for &(date, tvl) in base {
        let sum = enabled.iter().fold(tvl, |acc, kind| {
            acc + extras
                .get(*kind)
                .and_then(|series| series.get(&date))
                .copied()
                .unwrap_or(0.0)
        });
        if store.insert(date, sum).is_some() {
            warn!("Duplicate date {date} in TVL chart, keeping the last sample");
        }
    }

    if enabled.contains(&TvlKind::LiquidStaking) && enabled.contains(&TvlKind::DoubleCounted) {
        if let Some(overlap) = extras.get(&TvlKind::DcAndLsOverlap) {
            for (date, value) in store.iter_mut() {
                *value -= overlap.get(date).copied().unwrap_or(0.0);
            }
        }
    }

    let series: Vec<(i64, f64)> = store.into_iter().collect();
    let summary = summarize_chart(&series);
    TvlSummary { series, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtraSeries;
    use chrono::TimeZone;

    fn extras(entries: &[(TvlKind, &[(i64, f64)])]) -> ExtraTvlCharts {
        entries
            .iter()
            .map(|(kind, points)| (kind.clone(), points.iter().copied().collect::<ExtraSeries>()))
            .collect()
    }

    #[test]
    fn test_no_toggles_returns_base_unchanged() {
        let base = vec![(2, 110.0), (1, 100.0)];
        let out = aggregate(&base, &ExtraTvlCharts::default(), &[]);
        assert_eq!(out.series, base);
        assert_eq!(out.summary.total_value_usd, Some(100.0));
        assert_eq!(out.summary.value_change_24h_usd, Some(-10.0));
    }

    #[test]
    fn test_overlap_subtracted_only_with_both_toggles() {
        let base = [(1, 100.0)];
        let extras = extras(&[
            (TvlKind::LiquidStaking, &[(1, 10.0)]),
            (TvlKind::DoubleCounted, &[(1, 20.0)]),
            (TvlKind::DcAndLsOverlap, &[(1, 5.0)]),
        ]);

        let both = aggregate(
            &base,
            &extras,
            &[TvlKind::LiquidStaking, TvlKind::DoubleCounted],
        );
        assert_eq!(both.series, vec![(1, 125.0)]);

        let one = aggregate(&base, &extras, &[TvlKind::LiquidStaking]);
        assert_eq!(one.series, vec![(1, 110.0)]);
    }

    #[test]
    fn test_missing_samples_count_as_zero_and_output_is_sorted() {
        let base = [(3, 300.0), (1, 100.0), (2, 200.0)];
        let extras = extras(&[(TvlKind::Staking, &[(2, 20.0), (9, 99.0)])]);
        let out = aggregate(&base, &extras, &[TvlKind::Staking, TvlKind::Staking]);
        assert_eq!(out.series, vec![(1, 100.0), (2, 220.0), (3, 300.0)]);
        assert_eq!(out.summary.total_value_usd, Some(300.0));
        assert_eq!(out.summary.value_change_24h_usd, Some(80.0));
        let change = out.summary.change_24h.unwrap();
        assert!((change - 36.363636).abs() < 1e-5);
    }

    #[test]
    fn test_change_is_null_for_zero_or_missing_previous() {
        let out = aggregate(&[(1, 0.0), (2, 50.0)], &ExtraTvlCharts::default(), &[]);
        assert_eq!(out.summary.change_24h, None);
        assert_eq!(out.summary.value_change_24h_usd, Some(50.0));

        let out = aggregate(&[(1, 50.0)], &ExtraTvlCharts::default(), &[]);
        assert_eq!(out.summary.total_value_usd, Some(50.0));
        assert_eq!(out.summary.change_24h, None);
        assert_eq!(out.summary.value_change_24h_usd, None);

        let out = aggregate(&[], &ExtraTvlCharts::default(), &[]);
        assert_eq!(out.summary, ChartSummary::default());
    }

    #[test]
    fn test_summarize_chart_at_uses_day_window_and_staleness() {
        let day = 86_400;
        let series = [(0, 80.0), (day, 100.0), (day + 3_600, 105.0), (2 * day, 110.0)];
        let now = Utc.timestamp_opt(2 * day + 60, 0).unwrap();

        let summary = summarize_chart_at(&series, now);
        assert_eq!(summary.total_value_usd, Some(110.0));
        assert_eq!(summary.value_change_24h_usd, Some(10.0));
        assert_eq!(summary.change_24h, Some(10.0));

        let later = Utc.timestamp_opt(4 * day, 0).unwrap();
        let stale = summarize_chart_at(&series, later);
        assert_eq!(stale.total_value_usd, Some(110.0));
        assert_eq!(stale.change_24h, None);

        assert_eq!(summarize_chart_at(&[], now), ChartSummary::default());
    }
}
