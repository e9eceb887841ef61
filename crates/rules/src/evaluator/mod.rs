//! Spec evaluator: walks the spec tree against the resource store.
//!
//! Every rule of the tree is evaluated, failures included; rules run
//! concurrently up to `max_concurrent_rules`, the resources of one rule up
//! to `max_concurrent_resources`. Failures are data: a rule that cannot
//! load its resources is reported as `Error` and its siblings carry on.
//! Only the run's cancellation token stops rules early, and rules cut
//! short that way are reported as cancelled errors.

mod expr;
mod path;
mod result;
mod truth;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use futures::{FutureExt, StreamExt};
use tenet_catalog::Registry;
use tenet_core::{EvaluationConfig, Resource};
use tenet_graph::{LoadError, ResourceStore};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::schema::{Group, Node, Rule, Spec};
use expr::{ExprContext, Scope};
use truth::{Outcome, Truth};

pub use result::*;

#[derive(Debug, Clone)]
pub struct EvalOptions {
    pub max_concurrent_rules: usize,
    pub max_concurrent_resources: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_concurrent_rules: 8,
            max_concurrent_resources: 32,
        }
    }
}

impl From<&EvaluationConfig> for EvalOptions {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            max_concurrent_rules: config.max_concurrent_rules,
            max_concurrent_resources: config.max_concurrent_resources,
        }
    }
}

// ── Per-resource verdicts ───────────────────────────────────────────

enum Verdict {
    Excluded,
    Pass,
    Finding(ResourceFinding),
    Error(LoadError),
}

fn finding(resource: &Resource, kind: FindingKind, outcome: Outcome) -> Verdict {
    Verdict::Finding(ResourceFinding {
        resource_id: resource.id.clone(),
        kind,
        diagnostics: outcome.evidence,
        unresolved: outcome.unresolved,
    })
}

fn rule_error(err: &LoadError) -> RuleError {
    RuleError {
        message: err.to_string(),
        cancelled: err.is_cancelled(),
    }
}

fn errored(rule: &Rule, error: RuleError) -> RuleResult {
    RuleResult {
        id: rule.id.clone(),
        name: rule.name.clone(),
        resource: rule.resource.clone(),
        status: Status::Error,
        evaluated: 0,
        excluded: 0,
        findings: Vec::new(),
        error: Some(error),
        elapsed_ms: 0,
    }
}

// ── Evaluator ───────────────────────────────────────────────────────

pub struct SpecEvaluator {
    registry: Arc<Registry>,
    store: Arc<ResourceStore>,
    options: EvalOptions,
    rule_permits: Semaphore,
}

impl SpecEvaluator {
    pub fn new(registry: Arc<Registry>, store: Arc<ResourceStore>, options: EvalOptions) -> Self {
        let rule_permits = Semaphore::new(options.max_concurrent_rules.max(1));
        Self {
            registry,
            store,
            options,
            rule_permits,
        }
    }

    /// Evaluate the whole tree. Always returns a complete report.
    pub async fn evaluate(&self, spec: &Spec) -> Report {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, group = %spec.name, rules = spec.rules().len(), "evaluation started");

        let root = self.evaluate_group(spec).await;
        let summary = Summary::of(&root);
        let cancelled = self.store.is_cancelled();
        if cancelled {
            warn!(%run_id, "evaluation cancelled before completion");
        }
        info!(
            %run_id,
            rules = summary.rules,
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            partially_unresolved = summary.partially_unresolved,
            "evaluation finished"
        );

        Report {
            run_id,
            started_at,
            finished_at: Utc::now(),
            cancelled,
            status: root.status,
            summary,
            store: self.store.stats(),
            root,
        }
    }

    fn evaluate_group<'a>(&'a self, group: &'a Group) -> BoxFuture<'a, GroupResult> {
        async move {
            let children = join_all(group.children.iter().map(|child| self.evaluate_node(child))).await;
            GroupResult::new(group.name.clone(), children)
        }
        .boxed()
    }

    async fn evaluate_node(&self, node: &Node) -> NodeResult {
        match node {
            Node::Group(group) => NodeResult::Group(self.evaluate_group(group).await),
            Node::Rule(rule) => NodeResult::Rule(self.run_rule(rule).await),
        }
    }

    async fn run_rule(&self, rule: &Rule) -> RuleResult {
        let started = Instant::now();
        let cancel = self.store.cancel_token();

        let mut result = tokio::select! {
            biased;
            _ = cancel.cancelled() => errored(rule, rule_error(&LoadError::Cancelled)),
            result = self.scheduled_rule(rule) => result,
        };
        result.elapsed_ms = started.elapsed().as_millis() as u64;

        match result.status {
            Status::Pass => info!(rule = %rule.id, evaluated = result.evaluated, "rule passed"),
            Status::Error => warn!(
                rule = %rule.id,
                error = result.error.as_ref().map(|e| e.message.as_str()).unwrap_or_default(),
                "rule errored"
            ),
            status => warn!(
                rule = %rule.id,
                status = ?status,
                failing = result.failing_ids().len(),
                unresolved = result.unresolved_ids().len(),
                "rule did not pass"
            ),
        }
        result
    }

    async fn scheduled_rule(&self, rule: &Rule) -> RuleResult {
        let _permit = match self.rule_permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return errored(
                    rule,
                    RuleError {
                        message: "rule scheduler closed".to_string(),
                        cancelled: true,
                    },
                )
            }
        };
        self.evaluate_rule(rule).await
    }

    async fn evaluate_rule(&self, rule: &Rule) -> RuleResult {
        let snapshot = match self.store.all(&rule.resource).await {
            Ok(snapshot) => snapshot,
            Err(e) => return errored(rule, rule_error(&e)),
        };

        let ctx = ExprContext::new(&self.registry, &self.store);
        let verdicts: Vec<Verdict> = futures::stream::iter(snapshot.resources().iter().cloned())
            .map(|resource| judge(&ctx, rule, resource))
            .buffered(self.options.max_concurrent_resources.max(1))
            .collect()
            .await;

        let mut result = RuleResult {
            id: rule.id.clone(),
            name: rule.name.clone(),
            resource: rule.resource.clone(),
            status: Status::Pass,
            evaluated: 0,
            excluded: 0,
            findings: Vec::new(),
            error: None,
            elapsed_ms: 0,
        };
        for verdict in verdicts {
            match verdict {
                Verdict::Excluded => result.excluded += 1,
                Verdict::Pass => result.evaluated += 1,
                Verdict::Finding(finding) => {
                    result.evaluated += 1;
                    result.findings.push(finding);
                }
                Verdict::Error(e) => {
                    result.evaluated += 1;
                    if result.error.is_none() {
                        result.error = Some(rule_error(&e));
                    }
                }
            }
        }

        result.status = if result.error.is_some() {
            Status::Error
        } else if !result.failing_ids().is_empty() {
            Status::Fail
        } else if !result.findings.is_empty() {
            Status::PartiallyUnresolved
        } else {
            Status::Pass
        };
        result
    }
}

/// Filter, then assert, one resource.
async fn judge(ctx: &ExprContext<'_>, rule: &Rule, resource: Arc<Resource>) -> Verdict {
    let scope = Scope::new(Arc::clone(&resource));

    if let Some(filter) = &rule.filter {
        match ctx.evaluate(filter, &scope).await {
            Err(e) => return Verdict::Error(e),
            Ok(outcome) => match outcome.truth {
                Truth::True => {}
                Truth::False => return Verdict::Excluded,
                // Cannot tell whether the rule applies: report, don't drop.
                Truth::Unknown => return finding(&resource, FindingKind::Unresolved, outcome),
            },
        }
    }

    match ctx.evaluate(&rule.assert, &scope).await {
        Err(e) => Verdict::Error(e),
        Ok(outcome) => match outcome.truth {
            Truth::True => Verdict::Pass,
            Truth::False => finding(&resource, FindingKind::Fail, outcome),
            Truth::Unknown => finding(&resource, FindingKind::Unresolved, outcome),
        },
    }
}

#[cfg(test)]
mod tests;
