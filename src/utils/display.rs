//! Human-readable number formatting for table cells.
//!
//! Every formatter returns `None` for NaN and infinities so a broken ratio
//! renders as a blank cell instead of "NaN%" or "$Infinity".

// ============================================
// Plain and USD Amounts
// ============================================

const SUFFIXES: [(f64, &str); 4] = [
    (1e12, "t"),
    (1e9, "b"),
    (1e6, "m"),
    (1e3, "k"),
];

/// Formats an amount, optionally as USD.
///
/// - `>= 1M` is abbreviated with `k/m/b/t` and two decimals (`$3.34b`)
/// - `> 1000` gets thousands separators and no decimals (`$12,345`)
/// - below `0.0001` collapses to `< 0.0001`
/// - everything else keeps at most two decimals, trailing zeros trimmed
pub fn formatted_num(value: f64, usd: bool) -> Option<String> {
    if !value.is_finite() {
        return None;
    }

    let symbol = if usd { "$" } else { "" };
    if value == 0.0 {
        return Some(format!("{symbol}0"));
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if abs >= 1e6 {
        return Some(format!("{sign}{symbol}{}", abbreviate(abs)));
    }
    if abs < 0.0001 {
        return Some(format!("< {symbol}0.0001"));
    }
    if abs > 1000.0 {
        return Some(format!("{sign}{symbol}{}", with_thousands(abs.round() as u64)));
    }
    Some(format!("{sign}{symbol}{}", trim_decimals(abs, 2)))
}

fn abbreviate(abs: f64) -> String {
    for (scale, suffix) in SUFFIXES {
        if abs >= scale {
            return format!("{}{}", trim_decimals(abs / scale, 2), suffix);
        }
    }
    trim_decimals(abs, 2)
}

fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn trim_decimals(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

// ============================================
// Percentages
// ============================================

/// Formats a ratio or percentage.
///
/// Values strictly between -1 and 1 (excluding 0) are treated as ratios and
/// scaled by 100 first, so `0.25` renders as `25.00%` while `25` renders as
/// `25.00%` too. Above 100% decimals are dropped.
pub fn format_percent(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }

    let percent = if value != 0.0 && value.abs() < 1.0 {
        value * 100.0
    } else {
        value
    };

    if percent == 0.0 {
        return Some("0%".to_string());
    }
    if percent.abs() < 0.0001 {
        return Some("< 0.0001%".to_string());
    }

    let fixed = format!("{percent:.2}");
    if fixed.parse::<f64>().map(|v| v == 0.0).unwrap_or(false) {
        return Some("0%".to_string());
    }
    if percent > 100.0 {
        return Some(format!("{percent:.0}%"));
    }
    Some(format!("{fixed}%"))
}
