//! Chain-level aggregation: chart toggles, parent rollups and row toggles.

pub mod chart;
pub mod rollup;
pub mod rows;

pub use chart::{aggregate, prev_value_from_chart, summarize_chart, summarize_chart_at, ChartSummary, TvlSummary};
pub use rollup::{group_protocols, rollup};
pub use rows::apply_row_toggles;
