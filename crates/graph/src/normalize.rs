//! Loader-boundary normalization against the resource definition.

use tenet_catalog::{Multiplicity, ResourceDefinition};
use tenet_core::{Resource, Value};

/// Bring a freshly loaded resource into canonical shape:
/// absent or null list properties become empty lists, and association fields
/// are typed as ids (`Ref` for one, `RefList` for many, empty when absent).
pub fn normalize_resource(def: &ResourceDefinition, mut resource: Resource) -> Resource {
    for prop in def.properties.iter().filter(|p| p.is_list()) {
        let slot = resource.fields.entry(prop.name.clone()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::List(Vec::new());
        }
    }

    for assoc in &def.associations {
        let current = resource.fields.remove(&assoc.name).unwrap_or(Value::Null);
        let typed = match assoc.multiplicity {
            Multiplicity::One => match current {
                Value::String(id) | Value::Ref(id) => Value::Ref(id),
                Value::Number(n) => Value::Ref(Value::Number(n).to_string()),
                other => other,
            },
            Multiplicity::Many => match current {
                Value::Null => Value::RefList(Vec::new()),
                Value::String(id) | Value::Ref(id) => Value::RefList(vec![id]),
                Value::List(items) if items.iter().all(|v| v.as_str().is_some()) => Value::RefList(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ),
                other => other,
            },
        };
        resource.fields.insert(assoc.name.clone(), typed);
    }

    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_catalog::ElementKind;
    use tenet_core::ResourceDefRef;

    fn def() -> ResourceDefinition {
        ResourceDefinition::builder(ResourceDefRef::new("aws", "ec2", "instance"))
            .id("instance_id")
            .list_of("tags", ElementKind::Nested)
            .list_of("block_devices", ElementKind::Nested)
            .association("vpc", ResourceDefRef::new("aws", "ec2", "vpc"), Multiplicity::One)
            .association(
                "security_groups",
                ResourceDefRef::new("aws", "ec2", "security_group"),
                Multiplicity::Many,
            )
            .association("subnets", ResourceDefRef::new("aws", "ec2", "subnet"), Multiplicity::Many)
            .build()
    }

    #[test]
    fn absent_lists_become_empty() {
        let r = Resource::new(ResourceDefRef::new("aws", "ec2", "instance"), "i-1")
            .with("tags", Value::Null);
        let r = normalize_resource(&def(), r);
        assert_eq!(r.get("tags"), Some(&Value::List(vec![])));
        assert_eq!(r.get("block_devices"), Some(&Value::List(vec![])));
        assert_eq!(r.get("subnets"), Some(&Value::RefList(vec![])));
    }

    #[test]
    fn association_strings_become_ids() {
        let r = Resource::new(ResourceDefRef::new("aws", "ec2", "instance"), "i-1")
            .with("vpc", "vpc-1")
            .with("security_groups", vec!["sg-1", "sg-2"]);
        let r = normalize_resource(&def(), r);
        assert_eq!(r.get("vpc"), Some(&Value::Ref("vpc-1".into())));
        assert_eq!(
            r.get("security_groups"),
            Some(&Value::RefList(vec!["sg-1".into(), "sg-2".into()]))
        );
    }

    #[test]
    fn existing_values_are_kept() {
        let r = Resource::new(ResourceDefRef::new("aws", "ec2", "instance"), "i-1")
            .with("tags", vec![Value::from(tenet_core::KeyValue::new("env", "prod"))]);
        let r = normalize_resource(&def(), r);
        match r.get("tags") {
            Some(Value::List(items)) => assert_eq!(items.len(), 1),
            other => panic!("unexpected tags: {other:?}"),
        }
        // An absent single association stays absent-as-null.
        assert_eq!(r.get("vpc"), Some(&Value::Null));
    }
}
