//! Number sanitizing helpers.
//!
//! Metric payloads mix absent values, explicit nulls, zeros and the occasional
//! non-finite result of a division. These helpers give every caller the same
//! answer to "is this a usable number?".

// ============================================
// Finite Guards
// ============================================

/// Returns the value if it is a finite number, `None` for NaN and infinities.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Same as [`finite`] for an optional input.
#[inline]
pub fn finite_opt(value: Option<f64>) -> Option<f64> {
    value.and_then(finite)
}

/// Truthiness of an optional metric: present, not NaN, and not zero.
///
/// Several derived figures (tvl change, mcap/tvl) are only computed when the
/// base metric is truthy, so a zero TVL behaves like a missing one there.
#[inline]
pub fn is_truthy(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v != 0.0 && !v.is_nan())
}

// ============================================
// Optional Arithmetic
// ============================================

/// Adds two optional values, treating a missing side as 0.
/// Returns `None` only when both sides are missing.
#[inline]
pub fn add_present(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// Adds two optional values, propagating a missing side as `None`.
#[inline]
pub fn add_or_null(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    }
}
