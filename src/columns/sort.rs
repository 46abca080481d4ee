//! Sort keys for table columns.
//!
//! Rows whose key is `None` always end up at the bottom, whichever direction
//! the table is sorted in. Built-in numeric columns and custom columns share
//! the same ordering.

use std::cmp::Ordering;

use serde::Serialize;

use crate::formula::Value;
use crate::models::EffectiveFormat;
use crate::utils::finite_opt;

/// A totally ordered stand-in for a cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SortKey {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortKey {
    /// Key for a plain optional number; non-finite values are unsortable.
    pub fn number(value: Option<f64>) -> Option<SortKey> {
        finite_opt(value).map(SortKey::Number)
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn as_text(&self) -> String {
        match self {
            SortKey::Bool(b) => b.to_string(),
            SortKey::Number(n) => Value::Number(*n).to_string(),
            SortKey::Text(text) => text.clone(),
        }
    }
}

/// Normalizes an evaluated value for sorting under `format`.
///
/// - blank → `None`
/// - `usd`/`number`/`percent` → the number, or `0` for any other type
/// - `boolean` → the boolean, or `false` for any other type
/// - otherwise → the value unchanged
///
/// NaN and infinities count as blank in every format.
pub fn get_sortable_value(value: &Value, format: EffectiveFormat) -> Option<SortKey> {
    if value.is_blank() {
        return None;
    }

    if format.is_numeric() {
        return match value {
            Value::Number(n) => SortKey::number(Some(*n)),
            _ => Some(SortKey::Number(0.0)),
        };
    }

    if format == EffectiveFormat::Boolean {
        return match value {
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            _ => Some(SortKey::Bool(false)),
        };
    }

    match value {
        Value::Number(n) => SortKey::number(Some(*n)),
        Value::Bool(b) => Some(SortKey::Bool(*b)),
        Value::Text(text) => Some(SortKey::Text(text.clone())),
        Value::Blank => None,
    }
}

/// Ascending order of two present keys.
///
/// `string` columns compare everything as text; otherwise numbers compare
/// numerically, `false < true`, and mixed types group by type.
pub fn compare_keys(a: &SortKey, b: &SortKey, format: EffectiveFormat) -> Ordering {
    if format == EffectiveFormat::String {
        return a.as_text().cmp(&b.as_text());
    }

    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Orders two optional keys with missing keys last in both directions.
pub fn compare_falsy_last(
    a: Option<&SortKey>,
    b: Option<&SortKey>,
    descending: bool,
    format: EffectiveFormat,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_keys(a, b, format);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

/// Stable sort of `items` by `key`, missing keys last.
pub fn sort_falsy_last<T, F>(items: &mut Vec<T>, descending: bool, format: EffectiveFormat, key: F)
where
    F: Fn(&T) -> Option<SortKey>,
{
    let mut keyed: Vec<(Option<SortKey>, T)> =
        items.drain(..).map(|item| (key(&item), item)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_falsy_last(a.as_ref(), b.as_ref(), descending, format));
    items.extend(keyed.into_iter().map(|(_, item)| item));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[Option<f64>], descending: bool) -> Vec<Option<f64>> {
        let mut items = values.to_vec();
        sort_falsy_last(&mut items, descending, EffectiveFormat::Number, |v| {
            SortKey::number(*v)
        });
        items
    }

    #[test]
    fn test_missing_values_sort_last_in_both_directions() {
        let values = [Some(5.0), None, Some(2.0), None, Some(8.0)];
        assert_eq!(
            sorted(&values, true),
            vec![Some(8.0), Some(5.0), Some(2.0), None, None]
        );
        assert_eq!(
            sorted(&values, false),
            vec![Some(2.0), Some(5.0), Some(8.0), None, None]
        );
    }

    #[test]
    fn test_non_finite_numbers_sort_as_missing() {
        let values = [Some(f64::NAN), Some(1.0), Some(f64::INFINITY)];
        let out = sorted(&values, true);
        assert_eq!(out[0], Some(1.0));
        assert!(out[1].unwrap().is_nan());
        assert_eq!(out[2], Some(f64::INFINITY));
    }

    #[test]
    fn test_sortable_value_by_format() {
        let text = Value::Text("abc".to_string());
        assert_eq!(get_sortable_value(&Value::Blank, EffectiveFormat::Usd), None);
        assert_eq!(
            get_sortable_value(&Value::Text(String::new()), EffectiveFormat::String),
            None
        );
        assert_eq!(
            get_sortable_value(&Value::Number(3.0), EffectiveFormat::Percent),
            Some(SortKey::Number(3.0))
        );
        assert_eq!(
            get_sortable_value(&text, EffectiveFormat::Usd),
            Some(SortKey::Number(0.0))
        );
        assert_eq!(
            get_sortable_value(&Value::Number(1.0), EffectiveFormat::Boolean),
            Some(SortKey::Bool(false))
        );
        assert_eq!(
            get_sortable_value(&Value::Bool(true), EffectiveFormat::Boolean),
            Some(SortKey::Bool(true))
        );
        assert_eq!(
            get_sortable_value(&text, EffectiveFormat::String),
            Some(SortKey::Text("abc".to_string()))
        );
        assert_eq!(
            get_sortable_value(&Value::Number(f64::NAN), EffectiveFormat::Number),
            None
        );
    }

    #[test]
    fn test_string_and_boolean_ordering() {
        let mut names = vec!["b".to_string(), "a".to_string(), String::new(), "c".to_string()];
        sort_falsy_last(&mut names, false, EffectiveFormat::String, |n| {
            get_sortable_value(&Value::Text(n.clone()), EffectiveFormat::String)
        });
        assert_eq!(names, vec!["a", "b", "c", ""]);

        let mut flags = vec![true, false, true];
        sort_falsy_last(&mut flags, false, EffectiveFormat::Boolean, |b| {
            Some(SortKey::Bool(*b))
        });
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_string_format_compares_numbers_as_text() {
        let ord = compare_keys(
            &SortKey::Number(10.0),
            &SortKey::Number(9.0),
            EffectiveFormat::String,
        );
        assert_eq!(ord, Ordering::Less);
    }
}
