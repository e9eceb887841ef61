//! Expression evaluation against one resource.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tenet_catalog::Registry;
use tenet_core::{Resource, Value};
use tenet_graph::{LoadError, ResourceStore, UnresolvedRef};

use super::path::{expand, Cursor, PathMode};
use super::result::Diagnostic;
use super::truth::{self, Outcome, Truth};
use crate::predicates;
use crate::schema::{Expr, PredicateCall, Quantifier};

/// The resource under evaluation plus quantifier variables in scope.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    resource: Arc<Resource>,
    bindings: Vec<(String, Cursor)>,
}

impl Scope {
    pub fn new(resource: Arc<Resource>) -> Self {
        Self {
            resource,
            bindings: Vec::new(),
        }
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    /// Innermost binding wins.
    pub fn lookup(&self, name: &str) -> Option<&Cursor> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, cursor)| cursor)
    }

    fn bind(&self, name: &str, cursor: Cursor) -> Scope {
        let mut scope = self.clone();
        scope.bindings.push((name.to_string(), cursor));
        scope
    }
}

/// A predicate operand: its value, or unknown when an association on the
/// way did not resolve.
struct Operand {
    value: Value,
    unresolved: Vec<UnresolvedRef>,
    unknown: bool,
}

impl Operand {
    fn known(value: Value) -> Self {
        Self {
            value,
            unresolved: Vec::new(),
            unknown: false,
        }
    }
}

pub(crate) struct ExprContext<'a> {
    pub registry: &'a Registry,
    pub store: &'a ResourceStore,
}

impl<'a> ExprContext<'a> {
    pub fn new(registry: &'a Registry, store: &'a ResourceStore) -> Self {
        Self { registry, store }
    }

    pub fn evaluate<'e>(&'e self, expr: &'e Expr, scope: &'e Scope) -> BoxFuture<'e, Result<Outcome, LoadError>> {
        async move {
            match expr {
                Expr::Predicate(call) => self.predicate(call, scope).await,
                Expr::Quantifier(q) => self.quantifier(q, scope).await,
                Expr::And(children) => {
                    let mut outcomes = Vec::with_capacity(children.len());
                    for child in children {
                        outcomes.push(self.evaluate(child, scope).await?);
                    }
                    Ok(truth::conjunction(outcomes))
                }
                Expr::Or(children) => {
                    let mut outcomes = Vec::with_capacity(children.len());
                    for child in children {
                        outcomes.push(self.evaluate(child, scope).await?);
                    }
                    Ok(truth::disjunction(outcomes))
                }
                Expr::Not(inner) => Ok(self.evaluate(inner, scope).await?.negate()),
                Expr::Path(_) | Expr::Literal(_) => self.truthy(expr, scope).await,
            }
        }
        .boxed()
    }

    async fn predicate(&self, call: &PredicateCall, scope: &Scope) -> Result<Outcome, LoadError> {
        let actual = self.operand(&call.left, scope).await?;
        let expected = self.operand(&call.right, scope).await?;

        let property_path = match (call.left.as_ref(), call.right.as_ref()) {
            (Expr::Path(p), _) | (_, Expr::Path(p)) => p.to_string(),
            (left, _) => left.label(),
        };
        let check = Diagnostic {
            resource_id: scope.resource().id.clone(),
            property_path,
            operator: call.op.to_string(),
            expected: expected.value.clone(),
            actual: actual.value.clone(),
        };

        if actual.unknown || expected.unknown {
            let mut unresolved = actual.unresolved;
            unresolved.extend(expected.unresolved);
            return Ok(Outcome::unknown(check, unresolved));
        }
        let holds = predicates::evaluate(call.op, call.compare_as, &actual.value, &expected.value);
        Ok(Outcome::leaf(holds, check))
    }

    async fn quantifier(&self, q: &Quantifier, scope: &Scope) -> Result<Outcome, LoadError> {
        let (elements, unresolved) = self.collection(&q.collection, scope).await?;
        let count = elements.len();

        let mut outcomes = Vec::with_capacity(count + 1);
        for element in elements {
            let inner = scope.bind(&q.var, element);
            outcomes.push(self.evaluate(&q.inner, &inner).await?);
        }
        if !unresolved.is_empty() {
            // Unresolved elements may hold either way.
            outcomes.push(Outcome::unknown(
                self.collection_check(q, scope, Value::Null),
                unresolved,
            ));
        }

        let mut outcome = q.kind.apply(outcomes, |o| o);
        if outcome.truth == Truth::False && outcome.evidence.is_empty() {
            outcome
                .evidence
                .push(self.collection_check(q, scope, Value::from(count as i64)));
        }
        Ok(outcome)
    }

    fn collection_check(&self, q: &Quantifier, scope: &Scope, actual: Value) -> Diagnostic {
        Diagnostic {
            resource_id: scope.resource().id.clone(),
            property_path: q.collection.label(),
            operator: q.kind.to_string(),
            expected: Value::Null,
            actual,
        }
    }

    /// Elements a quantifier ranges over.
    async fn collection(&self, expr: &Expr, scope: &Scope) -> Result<(Vec<Cursor>, Vec<UnresolvedRef>), LoadError> {
        match expr {
            Expr::Path(path) => {
                let mut resolved = self.resolve(path, scope, PathMode::Collection).await?;
                let unresolved = std::mem::take(&mut resolved.unresolved);
                Ok((resolved.into_elements(), unresolved))
            }
            Expr::Literal(value) => Ok((expand(value.clone()), Vec::new())),
            other => {
                let operand = self.operand(other, scope).await?;
                Ok((expand(operand.value), operand.unresolved))
            }
        }
    }

    async fn operand(&self, expr: &Expr, scope: &Scope) -> Result<Operand, LoadError> {
        match expr {
            Expr::Literal(value) => Ok(Operand::known(value.clone())),
            Expr::Path(path) => {
                let mut resolved = self.resolve(path, scope, PathMode::Operand).await?;
                let unresolved = std::mem::take(&mut resolved.unresolved);
                Ok(Operand {
                    value: resolved.into_value(),
                    unknown: !unresolved.is_empty(),
                    unresolved,
                })
            }
            other => {
                let outcome = self.evaluate(other, scope).await?;
                Ok(match outcome.truth {
                    Truth::True => Operand::known(Value::Bool(true)),
                    Truth::False => Operand::known(Value::Bool(false)),
                    Truth::Unknown => Operand {
                        value: Value::Null,
                        unresolved: outcome.unresolved,
                        unknown: true,
                    },
                })
            }
        }
    }

    /// A bare path or literal used as a condition holds when it is `true`.
    async fn truthy(&self, expr: &Expr, scope: &Scope) -> Result<Outcome, LoadError> {
        let operand = self.operand(expr, scope).await?;
        let check = Diagnostic {
            resource_id: scope.resource().id.clone(),
            property_path: expr.label(),
            operator: "is_true".to_string(),
            expected: Value::Bool(true),
            actual: operand.value.clone(),
        };
        if operand.unknown {
            return Ok(Outcome::unknown(check, operand.unresolved));
        }
        Ok(Outcome::leaf(operand.value.as_bool() == Some(true), check))
    }
}
