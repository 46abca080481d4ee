//! Formula authoring helpers: a preview row, autocomplete and field warnings.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::formula::{
    flatten_record,
    lexer::{tokenize, TokenKind},
    resolve_alias, Function, AVAILABLE_FIELDS, AVAILABLE_FUNCTIONS,
};
use crate::models::{DexsTotals, MetricTotals, ProtocolRecord, TvlBuckets, TvlKind, TvlSnapshot};
use crate::utils::MonthlyAnnualized;

/// A representative protocol used to validate and preview formulas.
///
/// Every metric family and every toggleable TVL bucket is populated so that
/// any alias resolves to a value.
pub fn sample_protocol() -> ProtocolRecord {
    let mut tvl = TvlBuckets::new();
    tvl.insert(
        TvlKind::Default,
        TvlSnapshot::new(3_342_618_874.0, 3_300_000_000.0, 3_100_000_000.0, 2_900_000_000.0),
    );
    tvl.insert(
        TvlKind::Staking,
        TvlSnapshot::new(120_000_000.0, 118_000_000.0, 110_000_000.0, 95_000_000.0),
    );
    tvl.insert(
        TvlKind::Borrowed,
        TvlSnapshot::new(900_000_000.0, 880_000_000.0, 850_000_000.0, 800_000_000.0),
    );
    tvl.insert(
        TvlKind::Pool2,
        TvlSnapshot::new(4_000_000.0, 4_100_000.0, 4_300_000.0, 5_000_000.0),
    );
    tvl.insert(
        TvlKind::Vesting,
        TvlSnapshot::new(10_000_000.0, 10_000_000.0, 10_500_000.0, 11_000_000.0),
    );
    tvl.insert(
        TvlKind::Offers,
        TvlSnapshot::new(1_000_000.0, 1_000_000.0, 900_000.0, 800_000.0),
    );
    tvl.insert(
        TvlKind::DoubleCounted,
        TvlSnapshot::new(50_000_000.0, 49_000_000.0, 48_000_000.0, 45_000_000.0),
    );
    tvl.insert(
        TvlKind::LiquidStaking,
        TvlSnapshot::new(30_000_000.0, 29_500_000.0, 29_000_000.0, 27_000_000.0),
    );
    tvl.insert(
        TvlKind::GovTokens,
        TvlSnapshot::new(2_000_000.0, 2_000_000.0, 2_100_000.0, 2_500_000.0),
    );

    let fees = MetricTotals {
        total_24h: Some(13_689.0),
        total_7d: Some(95_000.0),
        total_30d: Some(410_000.0),
        total_1y: Some(5_000_000.0),
        monthly_average_1y: Some(416_666.0),
        total_all_time: Some(25_000_000.0),
        ..Default::default()
    };
    let revenue = MetricTotals {
        total_24h: Some(2_100.0),
        total_7d: Some(14_500.0),
        total_30d: Some(62_000.0),
        total_1y: Some(760_000.0),
        monthly_average_1y: Some(63_333.0),
        total_all_time: Some(3_800_000.0),
        ..Default::default()
    };
    let holders_revenue = MetricTotals {
        total_24h: Some(700.0),
        total_7d: Some(4_900.0),
        total_30d: Some(21_000.0),
        total_1y: Some(250_000.0),
        monthly_average_1y: Some(20_833.0),
        total_all_time: Some(1_200_000.0),
        ..Default::default()
    };
    let emissions = MetricTotals {
        total_24h: Some(5_000.0),
        total_7d: Some(35_000.0),
        total_30d: Some(150_000.0),
        total_1y: Some(1_825_000.0),
        monthly_average_1y: Some(152_083.0),
        total_all_time: Some(9_000_000.0),
        ..Default::default()
    };

    ProtocolRecord {
        id: Some("sample".to_string()),
        name: "Sample Protocol".to_string(),
        slug: "sample-protocol".to_string(),
        category: Some("Lending".to_string()),
        chains: vec!["Ethereum".to_string(), "Arbitrum".to_string()],
        tvl: Some(tvl),
        mcap: Some(1_500_000_000.0),
        fees: Some(fees),
        revenue: Some(revenue),
        holders_revenue: Some(holders_revenue),
        dexs: Some(DexsTotals {
            total_24h: Some(2_500_000.0),
            total_7d: Some(17_000_000.0),
            total_all_time: Some(900_000_000.0),
            change_7d_over_7d: Some(4.2),
        }),
        emissions: Some(emissions),
        ..Default::default()
    }
    .with_derived_metrics(&MonthlyAnnualized)
}

static SAMPLE_PATHS: Lazy<FxHashSet<String>> =
    Lazy::new(|| flatten_record(&sample_protocol()).into_keys().collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Field,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: &'static str,
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// Fields, then functions, whose names start with `prefix` (ignoring case).
pub fn suggestions(prefix: &str) -> Vec<Suggestion> {
    let prefix = prefix.to_lowercase();
    let fields = AVAILABLE_FIELDS
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .map(|name| Suggestion {
            name: *name,
            kind: SuggestionKind::Field,
            description: None,
        });
    let functions = AVAILABLE_FUNCTIONS
        .iter()
        .filter(|(name, _)| name.to_lowercase().starts_with(&prefix))
        .map(|(name, description)| Suggestion {
            name: *name,
            kind: SuggestionKind::Function,
            description: Some(*description),
        });
    fields.chain(functions).collect()
}

/// Identifiers in `formula` that are not an alias, a flattened path, a
/// function or a keyword. Order of first appearance, no duplicates.
///
/// A formula that does not tokenize yields nothing here; the parse error is
/// reported when the formula is evaluated.
pub fn unknown_identifiers(formula: &str) -> Vec<String> {
    let Ok(tokens) = tokenize(formula) else {
        return Vec::new();
    };

    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let TokenKind::Ident(name) = token.kind else {
            continue;
        };
        let known = resolve_alias(&name).is_some()
            || SAMPLE_PATHS.contains(&name)
            || Function::from_name(&name).is_some();
        if !known && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
