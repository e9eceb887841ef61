//! Collection quantifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierKind {
    All,
    Any,
    None,
}

/// A truth value a quantifier can fold: plain `bool`, or a richer logic
/// that supplies its own conjunction, disjunction and negation.
pub trait Verdict: Sized {
    /// True when `items` is empty.
    fn every(items: Vec<Self>) -> Self;
    /// False when `items` is empty.
    fn some(items: Vec<Self>) -> Self;
    fn negate(self) -> Self;
}

impl Verdict for bool {
    fn every(items: Vec<bool>) -> bool {
        items.into_iter().all(|b| b)
    }

    fn some(items: Vec<bool>) -> bool {
        items.into_iter().any(|b| b)
    }

    fn negate(self) -> bool {
        !self
    }
}

impl QuantifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantifierKind::All => "all",
            QuantifierKind::Any => "any",
            QuantifierKind::None => "none",
        }
    }

    /// Run the quantifier this kind names.
    pub fn apply<I, V, F>(self, items: I, pred: F) -> V
    where
        I: IntoIterator,
        V: Verdict,
        F: FnMut(I::Item) -> V,
    {
        match self {
            QuantifierKind::All => all(items, pred),
            QuantifierKind::Any => any(items, pred),
            QuantifierKind::None => none(items, pred),
        }
    }
}

impl fmt::Display for QuantifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vacuously true on an empty collection.
pub fn all<I, V, F>(items: I, pred: F) -> V
where
    I: IntoIterator,
    V: Verdict,
    F: FnMut(I::Item) -> V,
{
    V::every(items.into_iter().map(pred).collect())
}

/// False on an empty collection.
pub fn any<I, V, F>(items: I, pred: F) -> V
where
    I: IntoIterator,
    V: Verdict,
    F: FnMut(I::Item) -> V,
{
    V::some(items.into_iter().map(pred).collect())
}

/// Vacuously true on an empty collection.
pub fn none<I, V, F>(items: I, pred: F) -> V
where
    I: IntoIterator,
    V: Verdict,
    F: FnMut(I::Item) -> V,
{
    V::some(items.into_iter().map(pred).collect()).negate()
}
