//! Three-way comparisons for the ordering family.

use std::cmp::Ordering;

use tenet_core::Value;

/// Untyped ordering: numbers numerically, dates chronologically. Anything
/// else, including plain strings, is incomparable.
pub fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(_), _) | (_, Value::Number(_)) => compare_numbers(actual, expected),
        (Value::Date(_), _) | (_, Value::Date(_)) => {
            Some(actual.as_instant()?.cmp(&expected.as_instant()?))
        }
        _ => None,
    }
}

pub fn compare_numbers(actual: &Value, expected: &Value) -> Option<Ordering> {
    actual.as_f64()?.partial_cmp(&expected.as_f64()?)
}

/// Lexicographic ordering, for operands explicitly typed as ordered strings.
pub fn compare_strings(actual: &Value, expected: &Value) -> Option<Ordering> {
    Some(actual.as_str()?.cmp(expected.as_str()?))
}
