//! Tests for spec document types.

use super::*;
use crate::predicates::{CompareAs, Operator, QuantifierKind};
use tenet_core::{ResourceDefRef, Value};

const EC2_SPEC_YAML: &str = r#"
apiVersion: v1
kind: Spec
metadata:
  id: ec2-baseline
  name: EC2 Baseline
  tags: [aws, ec2]
spec:
  name: ec2
  children:
    - rule:
        id: ebs-optimized
        name: Instances are EBS optimized
        resource: aws.ec2.instance
        filter:
          predicate: { op: eq, left: { path: state }, right: { literal: running } }
        assert:
          predicate: { op: eq, left: { path: ebs_optimized }, right: { literal: true } }
    - group:
        name: network
        children:
          - rule:
              id: no-open-ssh
              resource: aws.ec2.security_group
              assert:
                quantifier:
                  kind: none
                  collection: { path: ip_permissions }
                  var: perm
                  satisfies:
                    and:
                      - predicate: { op: eq, left: { path: perm.from_port }, right: { literal: 22 } }
                      - predicate:
                          op: within_network
                          left: { literal: 8.8.8.8 }
                          right: { path: perm.cidr }
          - rule:
              id: vpc-in-private-range
              resource: aws.ec2.instance
              assert:
                not:
                  predicate:
                    op: gt
                    left: { path: vpc.cidr_block }
                    right: { literal: 10.255.255.255 }
                    compare_as: ip
"#;

#[test]
fn parse_spec_document() {
    let doc: SpecDocument = serde_yaml::from_str(EC2_SPEC_YAML).unwrap();
    assert_eq!(doc.api_version, "v1");
    assert_eq!(doc.kind, "Spec");
    assert_eq!(doc.metadata.id, "ec2-baseline");
    assert!(doc.metadata.enabled);
    assert_eq!(doc.spec.children.len(), 2);

    let rules = doc.spec.rules();
    let ids: Vec<_> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["ebs-optimized", "no-open-ssh", "vpc-in-private-range"]);
    assert_eq!(rules[0].resource, ResourceDefRef::new("aws", "ec2", "instance"));
    assert!(rules[0].filter.is_some());
}

#[test]
fn expressions_deserialize_into_the_tree() {
    let doc: SpecDocument = serde_yaml::from_str(EC2_SPEC_YAML).unwrap();
    let rules = doc.spec.rules();

    assert_eq!(rules[0].assert, Expr::check("ebs_optimized", Operator::Eq, true));

    match &rules[1].assert {
        Expr::Quantifier(q) => {
            assert_eq!(q.kind, QuantifierKind::None);
            assert_eq!(q.var, "perm");
            assert_eq!(*q.collection, Expr::path("ip_permissions"));
            match q.inner.as_ref() {
                Expr::And(children) => {
                    assert_eq!(children.len(), 2);
                    assert_eq!(children[0], Expr::check("perm.from_port", Operator::Eq, 22));
                }
                other => panic!("expected and, got {other:?}"),
            }
        }
        other => panic!("expected quantifier, got {other:?}"),
    }

    match &rules[2].assert {
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Predicate(call) => {
                assert_eq!(call.compare_as, CompareAs::Ip);
                assert_eq!(*call.right, Expr::Literal(Value::String("10.255.255.255".into())));
            }
            other => panic!("expected predicate, got {other:?}"),
        },
        other => panic!("expected not, got {other:?}"),
    }
}

#[test]
fn round_trip() {
    let doc: SpecDocument = serde_yaml::from_str(EC2_SPEC_YAML).unwrap();
    let yaml = serde_yaml::to_string(&doc).unwrap();
    let doc2: SpecDocument = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(doc, doc2);
}

#[test]
fn bare_groups_parse_from_map_form() {
    let yaml = r#"
name: root
children:
  - group:
      name: tags
      children:
        - rule:
            id: owner-tagged
            resource: aws.ec2.instance
            filter:
              not: { predicate: { op: eq, left: { path: state }, right: { literal: terminated } } }
            assert:
              quantifier:
                kind: any
                collection: { path: tags }
                var: tag
                satisfies:
                  or:
                    - predicate: { op: eq, left: { path: tag.key }, right: { literal: owner } }
                    - predicate: { op: eq, left: { path: tag.key }, right: { literal: Owner } }
"#;
    let group = Group::from_yaml(yaml).unwrap();
    let rules = group.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, "owner-tagged");
    assert_eq!(
        rules[0].filter,
        Some(Expr::not(Expr::check("state", Operator::Eq, "terminated")))
    );
    match &rules[0].assert {
        Expr::Quantifier(q) => {
            assert_eq!(q.kind, QuantifierKind::Any);
            assert!(matches!(q.inner.as_ref(), Expr::Or(children) if children.len() == 2));
        }
        other => panic!("expected quantifier, got {other:?}"),
    }
}

#[test]
fn malformed_specs_error() {
    // Resource type must be dotted provider.group.name
    let bad_type = r#"
name: root
children:
  - rule:
      id: r
      resource: ec2instance
      assert: { literal: true }
"#;
    assert!(Group::from_yaml(bad_type).is_err());

    // Unknown operator
    let bad_op = r#"
name: root
children:
  - rule:
      id: r
      resource: aws.ec2.instance
      assert:
        predicate: { op: roughly, left: { path: a }, right: { literal: 1 } }
"#;
    assert!(Group::from_yaml(bad_op).is_err());

    // Empty path segment
    let bad_path = r#"
name: root
children:
  - rule:
      id: r
      resource: aws.ec2.instance
      assert:
        predicate: { op: eq, left: { path: "vpc..cidr" }, right: { literal: 1 } }
"#;
    assert!(Group::from_yaml(bad_path).is_err());

    // Unknown field on a rule
    let unknown_field = r#"
name: root
children:
  - rule:
      id: r
      resource: aws.ec2.instance
      severity: high
      assert: { literal: true }
"#;
    assert!(Group::from_yaml(unknown_field).is_err());
}

#[test]
fn paths_parse_strictly_and_build_leniently() {
    let p: PropertyPath = "vpc.cidr_block".parse().unwrap();
    assert_eq!(p.segments(), ["vpc", "cidr_block"]);
    assert_eq!(p.head(), Some("vpc"));
    assert!("".parse::<PropertyPath>().is_err());
    assert!("a.".parse::<PropertyPath>().is_err());
    assert_eq!(PropertyPath::from_dotted("a..b").to_string(), "a.b");
    assert!(PropertyPath::from_dotted("").is_empty());
}

#[test]
fn labels_read_like_the_expression() {
    assert_eq!(Expr::check("ebs_optimized", Operator::Eq, true).label(), "ebs_optimized eq true");
    assert_eq!(
        Expr::none("ip_permissions", "p", Expr::literal(true)).label(),
        "none(ip_permissions)"
    );
}
