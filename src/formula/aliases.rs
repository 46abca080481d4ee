//! Short, user-facing field names for custom formulas.
//!
//! Each alias maps to a path in the flattened record namespace
//! (see [`super::flatten`]). Aliases are resolved on whole identifiers only,
//! so `tvl` never rewrites part of `tvl_staking` or `xtvl`.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Alias to flattened path.
pub const ALIASES: &[(&str, &str)] = &[
    // Identity
    ("name", "name"),
    ("category", "category"),
    ("mcap", "mcap"),
    ("mcaptvl", "mcaptvl"),
    ("strike_tvl", "strikeTvl"),
    // TVL
    ("tvl", "tvl_default_tvl"),
    ("tvl_prev_day", "tvl_default_tvlPrevDay"),
    ("tvl_prev_week", "tvl_default_tvlPrevWeek"),
    ("tvl_prev_month", "tvl_default_tvlPrevMonth"),
    ("change_1d", "tvlChange_change1d"),
    ("change_7d", "tvlChange_change7d"),
    ("change_1m", "tvlChange_change1m"),
    ("staking", "tvl_staking_tvl"),
    ("borrowed", "tvl_borrowed_tvl"),
    ("pool2", "tvl_pool2_tvl"),
    ("vesting", "tvl_vesting_tvl"),
    ("offers", "tvl_offers_tvl"),
    ("doublecounted", "tvl_doublecounted_tvl"),
    ("liquidstaking", "tvl_liquidstaking_tvl"),
    ("govtokens", "tvl_govtokens_tvl"),
    // Fees
    ("fees_24h", "fees_total24h"),
    ("fees_7d", "fees_total7d"),
    ("fees_30d", "fees_total30d"),
    ("fees_1y", "fees_total1y"),
    ("fees_avg_1y", "fees_monthlyAverage1y"),
    ("fees_all_time", "fees_totalAllTime"),
    ("pf", "fees_pf"),
    // Revenue
    ("revenue_24h", "revenue_total24h"),
    ("revenue_7d", "revenue_total7d"),
    ("revenue_30d", "revenue_total30d"),
    ("revenue_1y", "revenue_total1y"),
    ("revenue_avg_1y", "revenue_monthlyAverage1y"),
    ("revenue_all_time", "revenue_totalAllTime"),
    ("ps", "revenue_ps"),
    // Holders revenue
    ("holders_revenue_24h", "holdersRevenue_total24h"),
    ("holders_revenue_7d", "holdersRevenue_total7d"),
    ("holders_revenue_30d", "holdersRevenue_total30d"),
    ("holders_revenue_1y", "holdersRevenue_total1y"),
    ("holders_revenue_avg_1y", "holdersRevenue_monthlyAverage1y"),
    ("holders_revenue_all_time", "holdersRevenue_totalAllTime"),
    // DEX volume
    ("volume_24h", "dexs_total24h"),
    ("volume_7d", "dexs_total7d"),
    ("volume_all_time", "dexs_totalAllTime"),
    ("volume_change_7d", "dexs_change_7dover7d"),
    // Emissions
    ("emissions_24h", "emissions_total24h"),
    ("emissions_7d", "emissions_total7d"),
    ("emissions_30d", "emissions_total30d"),
    ("emissions_1y", "emissions_total1y"),
    ("emissions_avg_1y", "emissions_monthlyAverage1y"),
    ("emissions_all_time", "emissions_totalAllTime"),
];

/// Alias names in declaration order, for autocomplete.
pub static AVAILABLE_FIELDS: Lazy<Vec<&'static str>> =
    Lazy::new(|| ALIASES.iter().map(|(alias, _)| *alias).collect());

static ALIAS_LOOKUP: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| ALIASES.iter().copied().collect());

/// Flattened path for an alias.
pub fn resolve_alias(alias: &str) -> Option<&'static str> {
    ALIAS_LOOKUP.get(alias).copied()
}

/// Identifier characters; matches what a regex `\b` treats as a word.
#[inline]
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites every whole-word alias in `formula` to its flattened path.
///
/// Words are maximal runs of `[A-Za-z0-9_]`; a word is replaced only when it
/// equals an alias exactly. Quoted string literals are copied untouched.
/// Everything else, including whitespace and operators, is preserved.
///
/// # Example
/// ```ignore
/// assert_eq!(replace_aliases("fees_24h / tvl"), "fees_total24h / tvl_default_tvl");
/// ```
pub fn replace_aliases(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len() * 2);
    let mut chars = formula.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '"' || c == '\'' {
            out.push(c);
            let mut escaped = false;
            for (_, inner) in chars.by_ref() {
                out.push(inner);
                if escaped {
                    escaped = false;
                } else if inner == '\\' {
                    escaped = true;
                } else if inner == c {
                    break;
                }
            }
            continue;
        }

        if !is_word_char(c) {
            out.push(c);
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if !is_word_char(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }

        let word = &formula[start..end];
        out.push_str(resolve_alias(word).unwrap_or(word));
    }

    out
}
