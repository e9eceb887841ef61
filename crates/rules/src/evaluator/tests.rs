//! Evaluator tests over in-memory loaders.

use std::sync::Arc;
use std::time::Duration;

use tenet_catalog::{ElementKind, Multiplicity, Registry, ResourceDefinition};
use tenet_core::{KeyValue, Resource, ResourceDefRef, Value};
use tenet_graph::{LoaderTable, StaticLoader, StoreOptions, UnresolvedReason};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::predicates::Operator;
use crate::schema::Expr;

fn instance() -> ResourceDefRef {
    ResourceDefRef::new("aws", "ec2", "instance")
}

fn security_group() -> ResourceDefRef {
    ResourceDefRef::new("aws", "ec2", "security_group")
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            ResourceDefinition::builder(instance())
                .id("instance_id")
                .scalar("state")
                .scalar("private_ip")
                .list_of("tags", ElementKind::Nested)
                .association("security_groups", security_group(), Multiplicity::Many)
                .build(),
        )
        .unwrap();
    registry
        .register(
            ResourceDefinition::builder(security_group())
                .id("group_id")
                .scalar("group_name")
                .list_of("ip_permissions", ElementKind::Nested)
                .build(),
        )
        .unwrap();
    registry
}

fn permission(port: i64, cidr: &str) -> Value {
    let mut fields = std::collections::BTreeMap::new();
    fields.insert("from_port".to_string(), Value::from(port));
    fields.insert("cidr".to_string(), Value::from(cidr));
    Value::Record(fields)
}

fn instances() -> Vec<Resource> {
    vec![
        Resource::new(instance(), "i-1")
            .with("state", "running")
            .with("private_ip", "10.0.0.5")
            .with("tags", vec![Value::from(KeyValue::new("env", "prod"))])
            .with("security_groups", vec!["sg-web"]),
        Resource::new(instance(), "i-2")
            .with("state", "running")
            .with("private_ip", "172.16.0.9")
            .with("security_groups", vec!["sg-web", "sg-ssh"]),
        Resource::new(instance(), "i-3")
            .with("state", "stopped")
            .with("private_ip", "not-an-ip")
            .with("security_groups", vec!["sg-gone"]),
    ]
}

fn groups() -> Vec<Resource> {
    vec![
        Resource::new(security_group(), "sg-web")
            .with("group_name", "web")
            .with("ip_permissions", vec![permission(443, "0.0.0.0/0")]),
        Resource::new(security_group(), "sg-ssh")
            .with("group_name", "ssh")
            .with(
                "ip_permissions",
                vec![permission(22, "0.0.0.0/0"), permission(443, "10.0.0.0/8")],
            ),
    ]
}

struct Fixture {
    instances: Arc<StaticLoader>,
    evaluator: SpecEvaluator,
    cancel: CancellationToken,
}

fn fixture_with(instances: StaticLoader, options: EvalOptions) -> Fixture {
    let registry = Arc::new(registry());
    let instances = Arc::new(instances);
    let mut loaders = LoaderTable::new();
    loaders.bind(instance(), instances.clone()).unwrap();
    loaders
        .bind(security_group(), Arc::new(StaticLoader::new(groups())))
        .unwrap();
    let cancel = CancellationToken::new();
    let store = Arc::new(ResourceStore::with_options(
        Arc::clone(&registry),
        loaders,
        StoreOptions::default(),
        cancel.clone(),
    ));
    Fixture {
        instances,
        evaluator: SpecEvaluator::new(registry, store, options),
        cancel,
    }
}

fn fixture() -> Fixture {
    fixture_with(StaticLoader::new(instances()), EvalOptions::default())
}

async fn run_rule(rule: Rule) -> RuleResult {
    let report = fixture().evaluator.evaluate(&Group::new("root").with_rule(rule)).await;
    report.root.rules()[0].clone()
}

#[tokio::test]
async fn filter_excludes_without_failing() {
    let rule = Rule::new(
        "running-private",
        instance(),
        Expr::check("private_ip", Operator::WithinNetwork, "10.0.0.0/8"),
    )
    .with_filter(Expr::check("state", Operator::Eq, "running"));

    let result = run_rule(rule).await;
    assert_eq!(result.excluded, 1);
    assert_eq!(result.evaluated, 2);
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.failing_ids(), vec!["i-2"]);
}

#[tokio::test]
async fn negation_is_not_rewritten_into_the_counterpart() {
    // not(within) holds for junk input, without does not.
    let not_within = Rule::new(
        "not-within",
        instance(),
        Expr::not(Expr::check("private_ip", Operator::WithinNetwork, "192.168.0.0/16")),
    );
    assert_eq!(run_rule(not_within).await.status, Status::Pass);

    let without = Rule::new(
        "without",
        instance(),
        Expr::check("private_ip", Operator::WithoutNetwork, "192.168.0.0/16"),
    );
    let result = run_rule(without).await;
    assert_eq!(result.failing_ids(), vec!["i-3"]);
}

#[tokio::test]
async fn quantifiers_cross_many_associations() {
    // No attached group may open port 22 to the world.
    let rule = Rule::new(
        "no-open-ssh",
        instance(),
        Expr::all(
            "security_groups",
            "sg",
            Expr::none(
                "sg.ip_permissions",
                "perm",
                Expr::And(vec![
                    Expr::check("perm.from_port", Operator::Eq, 22),
                    Expr::check("perm.cidr", Operator::Eq, "0.0.0.0/0"),
                ]),
            ),
        ),
    );

    let result = run_rule(rule).await;
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.failing_ids(), vec!["i-2"]);
    assert_eq!(result.unresolved_ids(), vec!["i-3"]);

    let failing = &result.findings[0];
    assert!(failing
        .diagnostics
        .iter()
        .any(|d| d.property_path == "perm.from_port" && d.actual == Value::Number(22.0)));

    let unresolved = result.findings.iter().find(|f| f.resource_id == "i-3").unwrap();
    assert_eq!(unresolved.kind, FindingKind::Unresolved);
    assert_eq!(unresolved.unresolved[0].id, "sg-gone");
    assert_eq!(unresolved.unresolved[0].reason, UnresolvedReason::NotFound);
}

#[tokio::test]
async fn paths_fan_out_into_lists() {
    // Group names through the association, compared as a whole list.
    let rule = Rule::new(
        "names",
        instance(),
        Expr::check("security_groups.group_name", Operator::Eq, vec!["web"]),
    )
    .with_filter(Expr::check("instance_id", Operator::Eq, "i-1"));

    let result = run_rule(rule).await;
    assert_eq!(result.status, Status::Pass);
    assert_eq!(result.evaluated, 1);
}

#[tokio::test]
async fn nested_lists_and_bound_variables() {
    let rule = Rule::new(
        "tagged",
        instance(),
        Expr::any(
            "tags",
            "t",
            Expr::And(vec![
                Expr::check("t.key", Operator::Eq, "env"),
                Expr::check("t.value", Operator::Eq, "prod"),
            ]),
        ),
    );
    let result = run_rule(rule).await;
    assert_eq!(result.failing_ids(), vec!["i-2", "i-3"]);

    // An empty collection fails `any` with a diagnostic naming the collection.
    let empty = result.findings.iter().find(|f| f.resource_id == "i-2").unwrap();
    assert_eq!(empty.diagnostics.len(), 1);
    assert_eq!(empty.diagnostics[0].property_path, "tags");
    assert_eq!(empty.diagnostics[0].operator, "any");
    assert_eq!(empty.diagnostics[0].actual, Value::Number(0.0));
}

#[tokio::test]
async fn load_errors_stay_with_their_rule() {
    let f = fixture_with(StaticLoader::failing("AccessDenied"), EvalOptions::default());
    let spec = Group::new("root")
        .with_rule(Rule::new("instances", instance(), Expr::literal(true)))
        .with_rule(Rule::new(
            "groups",
            security_group(),
            Expr::check("group_name", Operator::Neq, ""),
        ));

    let report = f.evaluator.evaluate(&spec).await;
    let broken = report.root.find_rule("instances").unwrap();
    assert_eq!(broken.status, Status::Error);
    let error = broken.error.as_ref().unwrap();
    assert!(error.message.contains("AccessDenied"));
    assert!(!error.cancelled);

    assert_eq!(report.root.find_rule("groups").unwrap().status, Status::Pass);
    assert_eq!(report.root.status, Status::Error);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn every_rule_is_evaluated_and_loads_are_shared() {
    let f = fixture_with(
        StaticLoader::new(instances()),
        EvalOptions {
            max_concurrent_rules: 2,
            max_concurrent_resources: 1,
        },
    );
    let mut spec = Group::new("root");
    for n in 0..6 {
        spec = spec.with_rule(Rule::new(
            format!("r{n}"),
            instance(),
            Expr::check("state", Operator::Eq, "running"),
        ));
    }
    let nested = Group::new("nested").with_rule(Rule::new("r-nested", instance(), Expr::literal(true)));
    let spec = spec.with_group(nested);

    let report = f.evaluator.evaluate(&spec).await;
    assert_eq!(report.summary.rules, 7);
    assert_eq!(report.summary.failed, 6);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(f.instances.get_all_calls(), 1);
    assert_eq!(report.store.get_all_calls, 1);
}

#[tokio::test]
async fn cancelled_runs_report_unfinished_rules() {
    let f = fixture_with(
        StaticLoader::new(instances()).with_delay(Duration::from_secs(30)),
        EvalOptions::default(),
    );
    let spec = Group::new("root")
        .with_rule(Rule::new("slow", instance(), Expr::literal(true)))
        .with_rule(Rule::new("fast", security_group(), Expr::literal(true)));

    let trigger = f.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = f.evaluator.evaluate(&spec).await;
    assert!(report.cancelled);
    let slow = report.root.find_rule("slow").unwrap();
    assert_eq!(slow.status, Status::Error);
    assert!(slow.is_cancelled());
    assert_eq!(report.root.find_rule("fast").unwrap().status, Status::Pass);
}

#[tokio::test]
async fn empty_rule_population_passes() {
    let rule = Rule::new("none-running", instance(), Expr::literal(false))
        .with_filter(Expr::check("state", Operator::Eq, "terminated"));
    let result = run_rule(rule).await;
    assert_eq!(result.status, Status::Pass);
    assert_eq!(result.excluded, 3);
}
