//! Percent change, rounding and valuation ratios.

use super::validation::{finite, is_truthy};

// ============================================
// Percent Change
// ============================================

/// Percentage change from `previous` to `current`.
///
/// `(current - previous) / previous * 100`. Returns `None` when either side is
/// missing or the result is not finite, so a zero or absent previous value
/// never produces NaN or Infinity.
///
/// # Example
/// ```ignore
/// assert_eq!(percent_change(Some(100.0), Some(50.0)), Some(100.0));
/// assert_eq!(percent_change(Some(50.0), Some(0.0)), None);
/// ```
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    finite((current - previous) / previous * 100.0)
}

// ============================================
// Rounding
// ============================================

const MAX_DECIMALS: i32 = 308;

/// Half-up rounding (`floor(x + 0.5)`), so `-2.5` rounds to `-2`.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Rounds to `decimals` places with half-up semantics.
///
/// `decimals` is clamped to the range where `10^decimals` is a normal `f64`;
/// negative values round to tens, hundreds and so on.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals.clamp(-MAX_DECIMALS, MAX_DECIMALS));
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    round_half_up(scaled) / factor
}

// ============================================
// Valuation Ratios
// ============================================

/// Market cap over TVL, rounded to 2 decimals.
/// Only computed when both inputs are truthy.
pub fn mcap_to_tvl(mcap: Option<f64>, tvl: Option<f64>) -> Option<f64> {
    if !is_truthy(mcap) || !is_truthy(tvl) {
        return None;
    }
    finite(round_to(mcap? / tvl?, 2))
}

/// Turns a market cap and a 30-day flow total into a price-to-flow ratio
/// (P/F for fees, P/S for revenue).
///
/// Ratios are not additive, so parents recompute them from their own market
/// cap and summed totals through this seam instead of summing children.
pub trait AnnualizedRatio {
    fn ratio(&self, mcap: Option<f64>, total_30d: Option<f64>) -> Option<f64>;
}

/// Annualizes the 30-day total (x12) and divides market cap by it,
/// rounded to 2 decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyAnnualized;

impl AnnualizedRatio for MonthlyAnnualized {
    fn ratio(&self, mcap: Option<f64>, total_30d: Option<f64>) -> Option<f64> {
        if !is_truthy(mcap) || !is_truthy(total_30d) {
            return None;
        }
        finite(round_to(mcap? / (total_30d? * 12.0), 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change_null_safety() {
        assert_eq!(percent_change(Some(50.0), Some(0.0)), None);
        assert_eq!(percent_change(Some(50.0), None), None);
        assert_eq!(percent_change(None, Some(50.0)), None);
        assert_eq!(percent_change(Some(100.0), Some(50.0)), Some(100.0));
        assert_eq!(percent_change(Some(25.0), Some(50.0)), Some(-50.0));
    }

    #[test]
    fn test_round_to_half_up() {
        assert_eq!(round_to(1.005 * 1000.0, 0), 1005.0);
        assert_eq!(round_to(2.345, 1), 2.3);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_mcap_to_tvl_requires_truthy_inputs() {
        assert_eq!(mcap_to_tvl(Some(200.0), Some(100.0)), Some(2.0));
        assert_eq!(mcap_to_tvl(Some(100.0), Some(300.0)), Some(0.33));
        assert_eq!(mcap_to_tvl(Some(100.0), Some(0.0)), None);
        assert_eq!(mcap_to_tvl(None, Some(100.0)), None);
    }

    #[test]
    fn test_monthly_annualized_ratio() {
        let ratio = MonthlyAnnualized;
        assert_eq!(ratio.ratio(Some(1200.0), Some(10.0)), Some(10.0));
        assert_eq!(ratio.ratio(Some(1200.0), Some(0.0)), None);
        assert_eq!(ratio.ratio(None, Some(10.0)), None);
    }

    #[test]
    fn test_round_to_clamps_extreme_decimals() {
        assert_eq!(round_to(5.0, -400), 0.0);
        assert_eq!(round_to(5.0, i32::MIN), 0.0);
        assert_eq!(round_to(1234.0, -2), 1200.0);
        assert_eq!(round_to(1.5, 400), 1.5);
        assert_eq!(round_to(1.5, i32::MAX), 1.5);
    }

    #[test]
    fn test_round_to_leaves_non_finite_untouched() {
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }
}
