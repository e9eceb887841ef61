//! Resource type descriptors: properties, identifier, associations.

use serde::{Deserialize, Serialize};
use tenet_core::ResourceDefRef;

/// Shape of one property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Scalar,
    Nested,
    ListOf(ElementKind),
}

/// Element shape of a [`ValueKind::ListOf`] property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Scalar,
    Nested,
}

/// Schema entry for one attribute of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default = "default_kind", with = "serde_yaml::with::singleton_map")]
    pub kind: ValueKind,
    /// Marks the natural key used for by-id lookups. Exactly one per type.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub identifier: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_kind() -> ValueKind {
    ValueKind::Scalar
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            identifier: false,
            example_values: None,
            description: None,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Scalar)
    }

    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.example_values = Some(examples.into());
        self
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, ValueKind::ListOf(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    Many,
}

/// Foreign-key edge from a property of the owning type to instances of `target`.
///
/// The property holds ids only, never the referenced resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationDescriptor {
    pub name: String,
    pub target: ResourceDefRef,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: Multiplicity,
}

fn default_multiplicity() -> Multiplicity {
    Multiplicity::One
}

impl AssociationDescriptor {
    pub fn new(name: impl Into<String>, target: ResourceDefRef, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.into(),
            target,
            multiplicity,
        }
    }
}

/// Self-description of one resource type. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDefinition {
    #[serde(rename = "type")]
    pub def: ResourceDefRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub associations: Vec<AssociationDescriptor>,
}

impl ResourceDefinition {
    pub fn builder(def: ResourceDefRef) -> DefinitionBuilder {
        DefinitionBuilder {
            definition: ResourceDefinition {
                def,
                description: None,
                properties: Vec::new(),
                associations: Vec::new(),
            },
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// The identifying property. Registered definitions always have exactly one.
    pub fn id_property(&self) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.identifier)
    }

    /// Whether `name` is a property or association of this type.
    pub fn has_member(&self, name: &str) -> bool {
        self.property(name).is_some() || self.association(name).is_some()
    }

    /// All property and association names, for suggestions.
    pub fn member_names(&self) -> Vec<&str> {
        self.properties
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.associations.iter().map(|a| a.name.as_str()))
            .collect()
    }
}

/// Fluent construction of a [`ResourceDefinition`] for provider modules.
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    definition: ResourceDefinition,
}

impl DefinitionBuilder {
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.definition.description = Some(text.into());
        self
    }

    /// Add the identifying (scalar) property.
    pub fn id(mut self, name: impl Into<String>) -> Self {
        let mut prop = PropertyDescriptor::scalar(name);
        prop.identifier = true;
        self.definition.properties.push(prop);
        self
    }

    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::scalar(name))
    }

    pub fn nested(self, name: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::new(name, ValueKind::Nested))
    }

    pub fn list_of(self, name: impl Into<String>, element: ElementKind) -> Self {
        self.property(PropertyDescriptor::new(name, ValueKind::ListOf(element)))
    }

    pub fn property(mut self, prop: PropertyDescriptor) -> Self {
        self.definition.properties.push(prop);
        self
    }

    pub fn association(
        mut self,
        name: impl Into<String>,
        target: ResourceDefRef,
        multiplicity: Multiplicity,
    ) -> Self {
        self.definition
            .associations
            .push(AssociationDescriptor::new(name, target, multiplicity));
        self
    }

    pub fn build(self) -> ResourceDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_marks_identifier() {
        let def = ResourceDefinition::builder(ResourceDefRef::new("aws", "ec2", "instance"))
            .id("instance_id")
            .scalar("ebs_optimized")
            .list_of("tags", ElementKind::Nested)
            .association("vpc", ResourceDefRef::new("aws", "ec2", "vpc"), Multiplicity::One)
            .build();

        assert_eq!(def.id_property().map(|p| p.name.as_str()), Some("instance_id"));
        assert!(def.property("tags").unwrap().is_list());
        assert_eq!(def.association("vpc").unwrap().multiplicity, Multiplicity::One);
        assert!(def.has_member("vpc"));
        assert!(!def.has_member("subnet"));
    }

    #[test]
    fn parses_from_yaml() {
        let yaml = r#"
type: aws.ec2.security_group
description: VPC security group
properties:
  - name: group_id
    identifier: true
  - name: group_name
    example_values: "default, web"
  - name: ingress
    kind:
      list_of: nested
associations:
  - name: vpc
    target: aws.ec2.vpc
"#;
        let def: ResourceDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.def, ResourceDefRef::new("aws", "ec2", "security_group"));
        assert_eq!(def.properties.len(), 3);
        assert_eq!(def.properties[1].kind, ValueKind::Scalar);
        assert_eq!(def.properties[2].kind, ValueKind::ListOf(ElementKind::Nested));
        assert_eq!(def.associations[0].multiplicity, Multiplicity::One);
        assert_eq!(def.id_property().unwrap().name, "group_id");
    }

    #[test]
    fn value_kinds_read_and_write_as_plain_maps() {
        let yaml = r#"
type: aws.ec2.instance
properties:
  - name: instance_id
    identifier: true
  - name: state
    kind: scalar
  - name: placement
    kind: nested
  - name: private_ips
    kind: { list_of: scalar }
"#;
        let def: ResourceDefinition = serde_yaml::from_str(yaml).unwrap();
        let kinds: Vec<_> = def.properties.iter().map(|p| p.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Scalar,
                ValueKind::Scalar,
                ValueKind::Nested,
                ValueKind::ListOf(ElementKind::Scalar),
            ]
        );

        let written = serde_yaml::to_string(&def).unwrap();
        assert!(written.contains("list_of: scalar"), "{written}");
        assert!(!written.contains('!'), "{written}");
        let reread: ResourceDefinition = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, def);
    }
}
