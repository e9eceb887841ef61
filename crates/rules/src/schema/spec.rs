//! The spec tree: groups of rules.

use serde::{Deserialize, Serialize};
use tenet_core::ResourceDefRef;

use super::{CommonMetadata, Expr};

/// One spec file: header plus its root group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpecDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Nodes and expressions are written as single-key maps (`rule:`, `and:`).
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub spec: Group,
}

/// The root of an evaluated spec tree.
pub type Spec = Group;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Group(Group),
    Rule(Rule),
}

/// An assertion over every resource of one type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Resource type in dotted form, e.g. `aws.ec2.instance`.
    pub resource: ResourceDefRef,
    /// Resources for which this is not true are left out of the rule.
    #[serde(default)]
    pub filter: Option<Expr>,
    pub assert: Expr,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Parse a bare group written in the same map form as a spec document.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.children.push(Node::Rule(rule));
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.children.push(Node::Group(group));
        self
    }

    /// Every rule in the tree, depth first.
    pub fn rules(&self) -> Vec<&Rule> {
        let mut out = Vec::new();
        collect_rules(self, &mut out);
        out
    }
}

fn collect_rules<'a>(group: &'a Group, out: &mut Vec<&'a Rule>) {
    for child in &group.children {
        match child {
            Node::Group(g) => collect_rules(g, out),
            Node::Rule(r) => out.push(r),
        }
    }
}

impl Rule {
    pub fn new(id: impl Into<String>, resource: ResourceDefRef, assert: Expr) -> Self {
        Self {
            id: id.into(),
            name: None,
            resource,
            filter: None,
            assert,
        }
    }

    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }
}
