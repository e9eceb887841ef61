//! Chronological comparisons.
//!
//! Operands are dates or strings parseable as instants. When either side
//! fails to parse every date predicate is false, so `not_before` is only
//! the negation of `before` for valid pairs.

use std::cmp::Ordering;

use tenet_core::Value;

use super::Operator;

pub fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    Some(actual.as_instant()?.cmp(&expected.as_instant()?))
}

pub fn before(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected) == Some(Ordering::Less)
}

pub fn not_before(actual: &Value, expected: &Value) -> bool {
    matches!(compare(actual, expected), Some(Ordering::Equal | Ordering::Greater))
}

pub fn after(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected) == Some(Ordering::Greater)
}

pub fn not_after(actual: &Value, expected: &Value) -> bool {
    matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal))
}

/// Apply `op` chronologically. Ordering operators read as their date
/// counterparts (`lt` as `before`, `gte` as `not_before`); network
/// operators are false.
pub(crate) fn apply(op: Operator, actual: &Value, expected: &Value) -> bool {
    match op {
        Operator::Before | Operator::Lt => before(actual, expected),
        Operator::NotBefore | Operator::Gte => not_before(actual, expected),
        Operator::After | Operator::Gt => after(actual, expected),
        Operator::NotAfter | Operator::Lte => not_after(actual, expected),
        Operator::Eq | Operator::Neq => op.holds(compare(actual, expected)),
        Operator::WithinNetwork | Operator::WithoutNetwork => false,
    }
}
