//! Filter and assertion expressions.

use serde::{Deserialize, Serialize};
use tenet_core::Value;

use super::PropertyPath;
use crate::predicates::{CompareAs, Operator, QuantifierKind};

/// Expression tree evaluated against one resource.
///
/// ```yaml
/// and:
///   - predicate: { op: eq, left: { path: ebs_optimized }, right: { literal: true } }
///   - quantifier:
///       kind: none
///       collection: { path: ip_permissions }
///       var: perm
///       satisfies:
///         predicate: { op: within_network, left: { path: perm.cidr }, right: { literal: 0.0.0.0/0 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Path(PropertyPath),
    Literal(Value),
    Predicate(PredicateCall),
    Quantifier(Quantifier),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PredicateCall {
    pub op: Operator,
    /// Actual value.
    pub left: Box<Expr>,
    /// Expected value.
    pub right: Box<Expr>,
    #[serde(default)]
    pub compare_as: CompareAs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub collection: Box<Expr>,
    /// Name each element is bound to inside `satisfies`.
    pub var: String,
    #[serde(rename = "satisfies")]
    pub inner: Box<Expr>,
}

impl Expr {
    pub fn path(path: &str) -> Self {
        Expr::Path(PropertyPath::from_dotted(path))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn predicate(op: Operator, left: Expr, right: Expr) -> Self {
        Expr::Predicate(PredicateCall {
            op,
            left: Box::new(left),
            right: Box::new(right),
            compare_as: CompareAs::Auto,
        })
    }

    /// `path <op> literal`, the common case.
    pub fn check(path: &str, op: Operator, expected: impl Into<Value>) -> Self {
        Expr::predicate(op, Expr::path(path), Expr::literal(expected))
    }

    pub fn check_as(path: &str, op: Operator, compare_as: CompareAs, expected: impl Into<Value>) -> Self {
        Expr::Predicate(PredicateCall {
            op,
            left: Box::new(Expr::path(path)),
            right: Box::new(Expr::literal(expected)),
            compare_as,
        })
    }

    pub fn quantifier(kind: QuantifierKind, collection: &str, var: &str, inner: Expr) -> Self {
        Expr::Quantifier(Quantifier {
            kind,
            collection: Box::new(Expr::path(collection)),
            var: var.to_string(),
            inner: Box::new(inner),
        })
    }

    pub fn all(collection: &str, var: &str, inner: Expr) -> Self {
        Expr::quantifier(QuantifierKind::All, collection, var, inner)
    }

    pub fn any(collection: &str, var: &str, inner: Expr) -> Self {
        Expr::quantifier(QuantifierKind::Any, collection, var, inner)
    }

    pub fn none(collection: &str, var: &str, inner: Expr) -> Self {
        Expr::quantifier(QuantifierKind::None, collection, var, inner)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Short label for diagnostics.
    pub fn label(&self) -> String {
        match self {
            Expr::Path(p) => p.to_string(),
            Expr::Literal(v) => v.to_string(),
            Expr::Predicate(call) => format!("{} {} {}", call.left.label(), call.op, call.right.label()),
            Expr::Quantifier(q) => format!("{}({})", q.kind, q.collection.label()),
            Expr::And(_) => "and".to_string(),
            Expr::Or(_) => "or".to_string(),
            Expr::Not(inner) => format!("not({})", inner.label()),
        }
    }
}
