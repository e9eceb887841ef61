//! Three-valued (Kleene) truth with the checks that decided it.

use tenet_graph::UnresolvedRef;

use super::result::Diagnostic;
use crate::predicates::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Truth {
    True,
    False,
    /// Could not be decided because an association did not resolve.
    Unknown,
}

impl Truth {
    fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

/// Truth value of an expression plus the leaf checks that determine it.
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub truth: Truth,
    pub evidence: Vec<Diagnostic>,
    pub unresolved: Vec<UnresolvedRef>,
}

impl Outcome {
    pub fn leaf(holds: bool, check: Diagnostic) -> Self {
        Self {
            truth: if holds { Truth::True } else { Truth::False },
            evidence: vec![check],
            unresolved: Vec::new(),
        }
    }

    pub fn unknown(check: Diagnostic, unresolved: Vec<UnresolvedRef>) -> Self {
        Self {
            truth: Truth::Unknown,
            evidence: vec![check],
            unresolved,
        }
    }

    /// Flip the truth value. Evidence is kept, with its operators marked as
    /// negated; the check itself is never rewritten.
    pub fn negate(mut self) -> Self {
        self.truth = self.truth.negate();
        for check in &mut self.evidence {
            check.operator = match check
                .operator
                .strip_prefix("not(")
                .and_then(|rest| rest.strip_suffix(')'))
            {
                Some(inner) => inner.to_string(),
                None => format!("not({})", check.operator),
            };
        }
        self
    }
}

/// Kleene conjunction. Empty is true.
pub(crate) fn conjunction(outcomes: Vec<Outcome>) -> Outcome {
    combine(outcomes, Truth::False)
}

/// Kleene disjunction. Empty is false.
pub(crate) fn disjunction(outcomes: Vec<Outcome>) -> Outcome {
    combine(outcomes, Truth::True)
}

impl Verdict for Outcome {
    fn every(items: Vec<Outcome>) -> Outcome {
        conjunction(items)
    }

    fn some(items: Vec<Outcome>) -> Outcome {
        disjunction(items)
    }

    fn negate(self) -> Outcome {
        Outcome::negate(self)
    }
}

/// A child equal to `decisive` decides the result; otherwise any unknown
/// child makes it unknown; otherwise the result is the non-decisive value.
fn combine(outcomes: Vec<Outcome>, decisive: Truth) -> Outcome {
    let rank = |truth: Truth| {
        if truth == decisive {
            2
        } else if truth == Truth::Unknown {
            1
        } else {
            0
        }
    };
    let truth = outcomes
        .iter()
        .map(|o| o.truth)
        .max_by_key(|t| rank(*t))
        .unwrap_or(decisive.negate());

    let mut merged = Outcome {
        truth,
        evidence: Vec::new(),
        unresolved: Vec::new(),
    };
    for outcome in outcomes.into_iter().filter(|o| o.truth == truth) {
        merged.evidence.extend(outcome.evidence);
        merged.unresolved.extend(outcome.unresolved);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::QuantifierKind;
    use tenet_core::{ResourceDefRef, Value};
    use tenet_graph::UnresolvedReason;

    fn check(path: &str) -> Diagnostic {
        Diagnostic {
            resource_id: "r-1".into(),
            property_path: path.into(),
            operator: "eq".into(),
            expected: Value::Bool(true),
            actual: Value::Bool(false),
        }
    }

    fn t(path: &str) -> Outcome {
        Outcome::leaf(true, check(path))
    }

    fn f(path: &str) -> Outcome {
        Outcome::leaf(false, check(path))
    }

    fn u(path: &str) -> Outcome {
        Outcome::unknown(
            check(path),
            vec![UnresolvedRef {
                target: ResourceDefRef::new("aws", "ec2", "vpc"),
                id: "vpc-missing".into(),
                reason: UnresolvedReason::NotFound,
            }],
        )
    }

    #[test]
    fn conjunction_is_kleene() {
        assert_eq!(conjunction(vec![t("a"), t("b")]).truth, Truth::True);
        assert_eq!(conjunction(vec![t("a"), u("b")]).truth, Truth::Unknown);
        let out = conjunction(vec![u("a"), f("b"), t("c")]);
        assert_eq!(out.truth, Truth::False);
        assert_eq!(out.evidence.len(), 1);
        assert_eq!(out.evidence[0].property_path, "b");
        assert!(out.unresolved.is_empty());
        assert_eq!(conjunction(vec![]).truth, Truth::True);
    }

    #[test]
    fn disjunction_is_kleene() {
        assert_eq!(disjunction(vec![f("a"), u("b")]).truth, Truth::Unknown);
        assert_eq!(disjunction(vec![u("a"), t("b")]).truth, Truth::True);
        assert_eq!(disjunction(vec![f("a"), f("b")]).evidence.len(), 2);
        assert_eq!(disjunction(vec![]).truth, Truth::False);
    }

    #[test]
    fn unknown_carries_unresolved_refs() {
        let out = conjunction(vec![t("a"), u("vpc.cidr_block")]);
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.unresolved[0].id, "vpc-missing");
    }

    #[test]
    fn negation_marks_operators() {
        let out = t("a").negate();
        assert_eq!(out.truth, Truth::False);
        assert_eq!(out.evidence[0].operator, "not(eq)");
        assert_eq!(out.negate().evidence[0].operator, "eq");
        assert_eq!(u("a").negate().truth, Truth::Unknown);
    }

    #[test]
    fn quantifiers_over_empty_collections() {
        let quantify = |kind: QuantifierKind, outcomes: Vec<Outcome>| kind.apply(outcomes, |o| o).truth;
        assert_eq!(quantify(QuantifierKind::All, vec![]), Truth::True);
        assert_eq!(quantify(QuantifierKind::None, vec![]), Truth::True);
        assert_eq!(quantify(QuantifierKind::Any, vec![]), Truth::False);
        assert_eq!(quantify(QuantifierKind::None, vec![f("a"), t("b")]), Truth::False);
        assert_eq!(quantify(QuantifierKind::None, vec![f("a"), u("b")]), Truth::Unknown);
    }
}
