//! Named binary predicates over `(actual, expected)` value pairs.
//!
//! Every comparator returns a plain `bool` and never fails: input a family
//! cannot interpret yields `false` for every operator of that family,
//! including the "negative" ones (`neq`, `not_before`, `without_network`).
//! Negations are therefore not complements on malformed input and must not
//! be rewritten into one another.

pub mod collection;
pub mod date;
pub mod equality;
pub mod network;
pub mod ordering;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tenet_core::Value;

pub use collection::{QuantifierKind, Verdict};

/// Comparator name as written in specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Before,
    NotBefore,
    After,
    NotAfter,
    WithinNetwork,
    WithoutNetwork,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Before => "before",
            Operator::NotBefore => "not_before",
            Operator::After => "after",
            Operator::NotAfter => "not_after",
            Operator::WithinNetwork => "within_network",
            Operator::WithoutNetwork => "without_network",
        }
    }

    /// Whether a three-way comparison result satisfies this operator.
    /// `None` (incomparable) never does.
    pub(crate) fn holds(&self, ordering: Option<Ordering>) -> bool {
        use Ordering::*;
        match (self, ordering) {
            (_, None) => false,
            (Operator::Eq, Some(o)) => o == Equal,
            (Operator::Neq, Some(o)) => o != Equal,
            (Operator::Lt | Operator::Before, Some(o)) => o == Less,
            (Operator::Lte | Operator::NotAfter, Some(o)) => o != Greater,
            (Operator::Gt | Operator::After, Some(o)) => o == Greater,
            (Operator::Gte | Operator::NotBefore, Some(o)) => o != Less,
            (Operator::WithinNetwork | Operator::WithoutNetwork, Some(_)) => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the operands of an `eq`/`neq`/ordering call are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareAs {
    /// Structural equality; ordering for numbers and dates only.
    #[default]
    Auto,
    Number,
    /// Lexicographic ordering on strings.
    String,
    Date,
    Ip,
}

/// Evaluate `op` on `(actual, expected)`.
///
/// Date operators always use the date family and network operators the IP
/// family; `compare_as` selects the family for the others.
pub fn evaluate(op: Operator, compare_as: CompareAs, actual: &Value, expected: &Value) -> bool {
    match op {
        Operator::Before | Operator::NotBefore | Operator::After | Operator::NotAfter => {
            date::apply(op, actual, expected)
        }
        Operator::WithinNetwork | Operator::WithoutNetwork => network::apply(op, actual, expected),
        Operator::Eq | Operator::Neq | Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            match compare_as {
                CompareAs::Auto => match op {
                    Operator::Eq => equality::eq(actual, expected),
                    Operator::Neq => equality::neq(actual, expected),
                    _ => op.holds(ordering::compare(actual, expected)),
                },
                CompareAs::Number => op.holds(ordering::compare_numbers(actual, expected)),
                CompareAs::String => op.holds(ordering::compare_strings(actual, expected)),
                CompareAs::Date => date::apply(op, actual, expected),
                CompareAs::Ip => network::apply(op, actual, expected),
            }
        }
    }
}
