//! Chain overview table: snapshot in, sorted rows with custom column cells out.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::aggregate::{aggregate, apply_row_toggles, group_protocols, TvlSummary};
use crate::columns::{sort_falsy_last, ColumnCell, CompiledColumn, SortKey};
use crate::config::Settings;
use crate::formula::{flatten_record, resolve_alias, FlatRecord};
use crate::models::{ChainSnapshot, CustomColumnDef, EffectiveFormat, ProtocolRecord};
use crate::utils::MonthlyAnnualized;

const CUSTOM_PREFIX: &str = "custom:";
const DEFAULT_SORT_PATH: &str = "tvl_default_tvl";

/// What the table is ordered by.
#[derive(Debug, Clone, PartialEq)]
enum SortBy {
    /// A flattened record path.
    Field(String),
    /// Index into the table's custom columns.
    Custom(usize),
}

impl SortBy {
    fn resolve(raw: &str, columns: &[CompiledColumn]) -> Self {
        if let Some(name) = raw.strip_prefix(CUSTOM_PREFIX) {
            return match columns.iter().position(|c| c.name() == name) {
                Some(idx) => SortBy::Custom(idx),
                None => {
                    warn!("No custom column named {:?}, sorting by tvl", name);
                    SortBy::Field(DEFAULT_SORT_PATH.to_string())
                }
            };
        }
        match resolve_alias(raw) {
            Some(path) => SortBy::Field(path.to_string()),
            None => SortBy::Field(raw.to_string()),
        }
    }

    fn format(&self, columns: &[CompiledColumn]) -> EffectiveFormat {
        match self {
            SortBy::Custom(idx) => columns
                .get(*idx)
                .map_or(EffectiveFormat::Auto, CompiledColumn::format),
            SortBy::Field(_) => EffectiveFormat::Auto,
        }
    }

    fn key(&self, flat: &FlatRecord, cells: &[ColumnCell]) -> Option<SortKey> {
        match self {
            SortBy::Custom(idx) => cells.get(*idx).and_then(|cell| cell.sort_key.clone()),
            SortBy::Field(path) => match flat.get(path)? {
                JsonValue::Number(n) => SortKey::number(n.as_f64()),
                JsonValue::Bool(b) => Some(SortKey::Bool(*b)),
                JsonValue::String(s) if !s.is_empty() => Some(SortKey::Text(s.clone())),
                _ => None,
            },
        }
    }
}

/// One table row: the record, its custom column cells and its children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(flatten)]
    pub protocol: ProtocolRecord,
    /// Same order as [`ChainTable::columns`].
    pub custom_columns: Vec<ColumnCell>,
    pub sort_key: Option<SortKey>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableRow>,
}

impl TableRow {
    fn build(mut protocol: ProtocolRecord, columns: &[CompiledColumn], sort: &SortBy) -> Self {
        let children: Vec<TableRow> = protocol
            .child_protocols
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|child| TableRow::build(child, columns, sort))
            .collect();

        let flat = flatten_record(&protocol);
        let custom_columns: Vec<ColumnCell> = columns.iter().map(|c| c.cell(&flat)).collect();
        let sort_key = sort.key(&flat, &custom_columns);

        Self {
            protocol,
            custom_columns,
            sort_key,
            children,
        }
    }
}

/// Sorts rows and, with the same key, every row's children.
fn sort_rows(rows: &mut Vec<TableRow>, descending: bool, format: EffectiveFormat) {
    for row in rows.iter_mut() {
        sort_rows(&mut row.children, descending, format);
    }
    sort_falsy_last(rows, descending, format, |row| row.sort_key.clone());
}

/// A chain's protocol table and headline TVL chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTable {
    pub chain: String,
    pub tvl: TvlSummary,
    /// Custom column names, in definition order.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ChainTable {
    /// Runs the whole pipeline over one snapshot.
    ///
    /// Leaf records get their derived metrics, children are rolled up under
    /// their parents, the chart and the rows get the enabled TVL toggles and
    /// bounds, then every custom column is evaluated for every row and child
    /// and the rows are sorted with missing keys last.
    pub fn build(snapshot: ChainSnapshot, settings: &Settings, columns: &[CustomColumnDef]) -> Self {
        let ratio = MonthlyAnnualized;
        let enabled = settings.tvl.toggles();

        let leaves: Vec<ProtocolRecord> = snapshot
            .protocols
            .into_iter()
            .map(|record| record.with_derived_metrics(&ratio))
            .collect();
        let grouped = group_protocols(leaves, &snapshot.parent_protocols, &ratio);

        let tvl = aggregate(&snapshot.tvl_chart, &snapshot.extra_tvl_charts, &enabled);
        let records = apply_row_toggles(
            grouped,
            &enabled,
            settings.table.min_tvl,
            settings.table.max_tvl,
        );

        let compiled: Vec<CompiledColumn> = columns.iter().cloned().map(CompiledColumn::new).collect();
        let sort = SortBy::resolve(&settings.table.sort_by, &compiled);
        debug!("Sorting {} by {:?}", snapshot.chain, sort);

        let mut rows: Vec<TableRow> = records
            .into_iter()
            .map(|record| TableRow::build(record, &compiled, &sort))
            .collect();
        sort_rows(&mut rows, settings.table.descending, sort.format(&compiled));

        info!(
            "Built {} table with {} rows and {} custom columns",
            snapshot.chain,
            rows.len(),
            compiled.len()
        );

        Self {
            chain: snapshot.chain,
            tvl,
            columns: compiled.iter().map(|c| c.name().to_string()).collect(),
            rows,
        }
    }
}
