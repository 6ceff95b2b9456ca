//! Compact representation of sequences and sets
//!
//! Up to four elements print in full. Longer collections show the first
//! two and last two elements around an ellipsis: `[1, 2, ... 7, 8]`.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;

use serde_json::Value;

use crate::formatting::FormatError;

/// Number of elements printed in full
pub const COMPACT_LIMIT: usize = 4;

fn join<T: Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

/// Render `items` between `open` and `close`, eliding the middle
fn compact<'a, T, I>(items: I, len: usize, open: char, close: char) -> String
where
    T: Display + 'a,
    I: Iterator<Item = &'a T> + Clone,
{
    if len <= COMPACT_LIMIT {
        return format!("{open}{}{close}", join(items));
    }
    let left = join(items.clone().take(2));
    let right = join(items.skip(len - 2));
    format!("{open}{left}, ... {right}{close}")
}

/// Compact representation of a list: `[1, 2, ... 7, 8]`
pub fn compact_repr<T: Display>(items: &[T]) -> String {
    compact(items.iter(), items.len(), '[', ']')
}

/// Compact representation of a set in iteration order: `{1, 2, ... 6, 7}`.
///
/// An empty set prints as `set()` so it is not mistaken for a mapping.
pub fn compact_repr_set<T: Display>(items: &BTreeSet<T>) -> String {
    if items.is_empty() {
        return "set()".to_string();
    }
    compact(items.iter(), items.len(), '{', '}')
}

/// Like [`compact_repr_set`] for hash sets, whose order is unspecified
pub fn compact_repr_hash_set<T: Display>(items: &HashSet<T>) -> String {
    if items.is_empty() {
        return "set()".to_string();
    }
    compact(items.iter(), items.len(), '{', '}')
}

/// Compact representation of a JSON array; anything else is unsupported
pub fn compact_repr_value(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Array(items) => Ok(compact_repr(items)),
        other => Err(FormatError::unsupported("compact_repr", other)),
    }
}

/// Total order on JSON values: by kind, then numbers by magnitude and
/// everything else by its serialized text
fn value_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => x.to_string().cmp(&y.to_string()),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Compact representation of a JSON array as a set: ordered, duplicates removed
pub fn compact_repr_value_set(value: &Value) -> Result<String, FormatError> {
    let Value::Array(items) = value else {
        return Err(FormatError::unsupported("compact_repr", value));
    };
    if items.is_empty() {
        return Ok("set()".to_string());
    }
    let mut sorted: Vec<&Value> = items.iter().collect();
    sorted.sort_by(|a, b| value_order(a, b));
    sorted.dedup_by(|a, b| value_order(a, b) == Ordering::Equal);
    Ok(compact(sorted.iter().copied(), sorted.len(), '{', '}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    #[test]
    fn test_compact_repr_set_empty() {
        assert_eq!(compact_repr_set(&BTreeSet::<i32>::new()), "set()");
        assert_eq!(compact_repr_hash_set(&HashSet::<i32>::new()), "set()");
    }

    #[test]
    fn test_compact_repr_list_empty() {
        assert_eq!(compact_repr::<i32>(&[]), "[]");
    }

    #[test]
    fn test_compact_repr_short() {
        assert_eq!(compact_repr_set(&BTreeSet::from([1, 2, 3])), "{1, 2, 3}");
        assert_eq!(compact_repr(&[1, 2, 3]), "[1, 2, 3]");
        assert_eq!(compact_repr(&[1, 2, 3, 4]), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_compact_repr_long() {
        assert_snapshot!(compact_repr_set(&BTreeSet::from([1, 2, 3, 4, 5])), @"{1, 2, ... 4, 5}");
        assert_snapshot!(compact_repr_set(&(1..=7).collect()), @"{1, 2, ... 6, 7}");
        assert_snapshot!(compact_repr(&[1, 2, 3, 4, 5, 6, 7, 8]), @"[1, 2, ... 7, 8]");
    }

    #[test]
    fn test_compact_repr_hash_set_long_has_ellipsis() {
        let set: HashSet<i32> = (0..10).collect();
        let repr = compact_repr_hash_set(&set);
        assert!(repr.starts_with('{') && repr.ends_with('}'));
        assert!(repr.contains(", ... "));
    }

    #[test]
    fn test_compact_repr_value() {
        assert_eq!(
            compact_repr_value(&json!(["a", "b", "c", "d", "e"])).unwrap(),
            r#"["a", "b", ... "d", "e"]"#
        );
        assert_eq!(compact_repr_value(&json!([])).unwrap(), "[]");
    }

    #[test]
    fn test_compact_repr_unsupported_type() {
        let err = compact_repr_value(&json!({"1": 2})).unwrap_err();
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn test_compact_repr_value_set_orders_numbers_numerically() {
        assert_snapshot!(
            compact_repr_value_set(&json!([10, 9, 2, 1, 3])).unwrap(),
            @"{1, 2, ... 9, 10}"
        );
        assert_eq!(
            compact_repr_value_set(&json!([5, 1, 5, 3, 1.5])).unwrap(),
            "{1, 1.5, 3, 5}"
        );
        assert_eq!(
            compact_repr_value_set(&json!(["b", "a", "b"])).unwrap(),
            r#"{"a", "b"}"#
        );
        assert_eq!(compact_repr_value_set(&json!([])).unwrap(), "set()");
        assert!(compact_repr_value_set(&json!("x")).is_err());
    }
}
