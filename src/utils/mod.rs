//! Utility functions shared by the aggregation and column engines.
//!
//! This module is organized into focused submodules:
//!
//! - [`validation`] - Finite-number guards and optional arithmetic
//! - [`change`] - Percent change, rounding and valuation ratios
//! - [`display`] - Number and percentage formatting for cells
//! - [`text`] - Slug generation

mod change;
mod display;
mod text;
mod validation;

// ============================================
// Re-exports
// ============================================

// Change and ratio utilities
pub use change::{
    mcap_to_tvl, percent_change, round_half_up, round_to, AnnualizedRatio, MonthlyAnnualized,
};

// Display utilities
pub use display::{format_percent, formatted_num};

// Text utilities
pub use text::slug;

// Validation utilities
pub use validation::{add_or_null, add_present, finite, finite_opt, is_truthy};
