//! Tree, rule and expression checks.

use std::collections::HashSet;

use tenet_catalog::{Registry, ResourceDefinition};

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;
use crate::schema::{Expr, Group, Node, Rule};

// ── Tree walk ───────────────────────────────────────────────────────

pub(super) fn validate_tree(root: &Group, registry: &Registry, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    walk_group(root, &root.name, registry, &mut seen, result);
}

fn walk_group<'a>(
    group: &'a Group,
    at: &str,
    registry: &Registry,
    seen: &mut HashSet<&'a str>,
    result: &mut ValidationResult,
) {
    if group.children.is_empty() {
        result.warn(at, format!("group '{}' has no rules", group.name));
    }
    for child in &group.children {
        match child {
            Node::Group(g) => walk_group(g, &format!("{at}/{}", g.name), registry, seen, result),
            Node::Rule(rule) => {
                let at = format!("{at}/{}", rule.id);
                if !seen.insert(rule.id.as_str()) {
                    result.error(&at, format!("duplicate rule id '{}'", rule.id));
                }
                validate_rule(rule, &at, registry, result);
            }
        }
    }
}

// ── Rule checks ─────────────────────────────────────────────────────

fn validate_rule(rule: &Rule, at: &str, registry: &Registry, result: &mut ValidationResult) {
    if rule.id.trim().is_empty() {
        result.error(at, "rule id must not be empty");
    } else if !is_kebab_case(&rule.id) {
        result.warn(
            at,
            format!("rule id should be kebab-case (lowercase alphanumeric + hyphens), got '{}'", rule.id),
        );
    }

    let definition = registry.lookup(&rule.resource);
    if definition.is_none() {
        let known: Vec<String> = registry.refs().map(ToString::to_string).collect();
        let candidates: Vec<&str> = known.iter().map(String::as_str).collect();
        let requested = rule.resource.to_string();
        result.error_with_suggestion(
            format!("{at}.resource"),
            format!("unknown resource type '{requested}'"),
            fuzzy_match(&requested, &candidates).map(|s| format!("did you mean '{s}'?")),
        );
    }

    let mut vars = Vec::new();
    if let Some(filter) = &rule.filter {
        check_expr(filter, definition, &mut vars, &format!("{at}.filter"), result);
    }
    check_expr(&rule.assert, definition, &mut vars, &format!("{at}.assert"), result);
}

// ── Expression checks ───────────────────────────────────────────────

fn check_expr(
    expr: &Expr,
    definition: Option<&ResourceDefinition>,
    vars: &mut Vec<String>,
    at: &str,
    result: &mut ValidationResult,
) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Path(path) => match path.head() {
            None => result.error(at, "empty property path"),
            Some(head) if vars.iter().any(|v| v == head) => {}
            Some(head) => {
                // Unknown types are already reported at the rule.
                let Some(def) = definition else { return };
                if def.has_member(head) {
                    return;
                }
                let members = def.member_names();
                let hint = match fuzzy_match(head, &members) {
                    Some(s) => format!(" (did you mean '{s}'?)"),
                    None => String::new(),
                };
                result.warn(
                    at,
                    format!("'{head}' in path '{path}' is not a property of {}{hint}", def.def),
                );
            }
        },
        Expr::Predicate(call) => {
            check_expr(&call.left, definition, vars, at, result);
            check_expr(&call.right, definition, vars, at, result);
        }
        Expr::Quantifier(q) => {
            check_expr(&q.collection, definition, vars, at, result);
            if vars.contains(&q.var) {
                result.warn(at, format!("quantifier variable '{}' shadows an outer one", q.var));
            } else if definition.is_some_and(|d| d.has_member(&q.var)) {
                result.warn(at, format!("quantifier variable '{}' hides a property of the same name", q.var));
            }
            vars.push(q.var.clone());
            check_expr(&q.inner, definition, vars, at, result);
            vars.pop();
        }
        Expr::And(children) | Expr::Or(children) => {
            if children.is_empty() {
                result.warn(at, "empty and/or expression");
            }
            for child in children {
                check_expr(child, definition, vars, at, result);
            }
        }
        Expr::Not(inner) => check_expr(inner, definition, vars, at, result),
    }
}

#[cfg(test)]
mod tests {
    use tenet_catalog::{ElementKind, Multiplicity, ResourceDefinition};
    use tenet_core::ResourceDefRef;

    use super::super::validate_spec;
    use super::*;
    use crate::predicates::Operator;

    fn instance() -> ResourceDefRef {
        ResourceDefRef::new("aws", "ec2", "instance")
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                ResourceDefinition::builder(instance())
                    .id("instance_id")
                    .scalar("ebs_optimized")
                    .list_of("tags", ElementKind::Nested)
                    .association("vpc", ResourceDefRef::new("aws", "ec2", "vpc"), Multiplicity::One)
                    .build(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn clean_spec_is_valid() {
        let spec = Group::new("ec2")
            .with_rule(Rule::new("ebs", instance(), Expr::check("ebs_optimized", Operator::Eq, true)))
            .with_rule(Rule::new(
                "tagged",
                instance(),
                Expr::any("tags", "t", Expr::check("t.key", Operator::Eq, "env")),
            ));
        let result = validate_spec(&spec, &registry());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn unknown_type_suggests_closest() {
        let spec = Group::new("ec2").with_rule(Rule::new(
            "ebs",
            ResourceDefRef::new("aws", "ec2", "instances"),
            Expr::literal(true),
        ));
        let result = validate_spec(&spec, &registry());
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "ec2/ebs.resource");
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("did you mean 'aws.ec2.instance'?")
        );
    }

    #[test]
    fn duplicate_rule_ids_across_groups() {
        let spec = Group::new("root")
            .with_rule(Rule::new("ebs", instance(), Expr::literal(true)))
            .with_group(Group::new("nested").with_rule(Rule::new("ebs", instance(), Expr::literal(true))));
        let result = validate_spec(&spec, &registry());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "root/nested/ebs");
    }

    #[test]
    fn advisory_warnings() {
        let spec = Group::new("root")
            .with_group(Group::new("empty"))
            .with_rule(Rule::new(
                "Bad_Id",
                instance(),
                Expr::And(vec![
                    Expr::check("ebs_optimised", Operator::Eq, true),
                    Expr::any("tags", "t", Expr::any("tags", "t", Expr::literal(true))),
                ]),
            ));
        let result = validate_spec(&spec, &registry());
        assert!(result.valid);
        let messages: Vec<_> = result.warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("group 'empty' has no rules")));
        assert!(messages.iter().any(|m| m.contains("kebab-case")));
        assert!(messages
            .iter()
            .any(|m| m.contains("'ebs_optimised'") && m.contains("did you mean 'ebs_optimized'?")));
        assert!(messages.iter().any(|m| m.contains("shadows an outer one")));
    }

    #[test]
    fn empty_paths_are_errors() {
        let spec = Group::new("root").with_rule(Rule::new("ebs", instance(), Expr::path("")));
        let result = validate_spec(&spec, &registry());
        assert!(!result.valid);
        assert_eq!(result.errors[0].message, "empty property path");
    }
}
