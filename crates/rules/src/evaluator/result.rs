//! Result tree produced by a run, mirroring the spec tree.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tenet_core::{ResourceDefRef, Value};
use tenet_graph::{StoreStats, UnresolvedRef};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Error,
    PartiallyUnresolved,
}

impl Status {
    fn severity(self) -> u8 {
        match self {
            Status::Pass => 0,
            Status::PartiallyUnresolved => 1,
            Status::Error => 2,
            Status::Fail => 3,
        }
    }

    /// `Pass` iff every status is `Pass`, otherwise the most severe one.
    pub fn aggregate<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses
            .into_iter()
            .max_by_key(|s| s.severity())
            .unwrap_or(Status::Pass)
    }

    pub fn is_pass(self) -> bool {
        self == Status::Pass
    }
}

/// Why one resource did not pass: the check, the expected and the actual value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub resource_id: String,
    pub property_path: String,
    pub operator: String,
    pub expected: Value,
    pub actual: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Fail,
    Unresolved,
}

/// A resource whose assertion did not pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceFinding {
    pub resource_id: String,
    pub kind: FindingKind,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleError {
    pub message: String,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub resource: ResourceDefRef,
    pub status: Status,
    /// Resources the assertion was evaluated on.
    pub evaluated: usize,
    /// Resources left out by the filter.
    pub excluded: usize,
    pub findings: Vec<ResourceFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RuleError>,
    pub elapsed_ms: u64,
}

impl RuleResult {
    pub fn failing_ids(&self) -> Vec<&str> {
        self.ids_of(FindingKind::Fail)
    }

    pub fn unresolved_ids(&self) -> Vec<&str> {
        self.ids_of(FindingKind::Unresolved)
    }

    fn ids_of(&self, kind: FindingKind) -> Vec<&str> {
        self.findings
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.resource_id.as_str())
            .collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub name: String,
    pub status: Status,
    pub children: Vec<NodeResult>,
}

impl GroupResult {
    pub fn new(name: impl Into<String>, children: Vec<NodeResult>) -> Self {
        let status = Status::aggregate(children.iter().map(NodeResult::status));
        Self {
            name: name.into(),
            status,
            children,
        }
    }

    /// Every rule result in the tree, depth first.
    pub fn rules(&self) -> Vec<&RuleResult> {
        let mut out = Vec::new();
        collect_rules(self, &mut out);
        out
    }

    pub fn find_rule(&self, id: &str) -> Option<&RuleResult> {
        self.rules().into_iter().find(|r| r.id == id)
    }
}

fn collect_rules<'a>(group: &'a GroupResult, out: &mut Vec<&'a RuleResult>) {
    for child in &group.children {
        match child {
            NodeResult::Group(g) => collect_rules(g, out),
            NodeResult::Rule(r) => out.push(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeResult {
    Group(GroupResult),
    Rule(RuleResult),
}

impl NodeResult {
    pub fn status(&self) -> Status {
        match self {
            NodeResult::Group(g) => g.status,
            NodeResult::Rule(r) => r.status,
        }
    }
}

/// Rule counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub rules: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub partially_unresolved: usize,
}

impl Summary {
    pub fn of(root: &GroupResult) -> Self {
        let mut summary = Summary::default();
        for rule in root.rules() {
            summary.rules += 1;
            match rule.status {
                Status::Pass => summary.passed += 1,
                Status::Fail => summary.failed += 1,
                Status::Error => summary.errored += 1,
                Status::PartiallyUnresolved => summary.partially_unresolved += 1,
            }
        }
        summary
    }
}

/// One evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub status: Status,
    pub summary: Summary,
    pub store: StoreStats,
    pub root: GroupResult,
}

impl Report {
    /// No rule failed or errored. Unresolved rules are reported but tolerated.
    pub fn is_clean(&self) -> bool {
        self.summary.failed == 0 && self.summary.errored == 0
    }
}
