//! In-memory registry of resource definitions keyed by [`ResourceDefRef`].

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tenet_core::ResourceDefRef;
use tracing::debug;

use crate::definition::ResourceDefinition;
use crate::document::ResourceSchemaDocument;
use crate::error::CatalogError;

/// Schema registry populated once at startup, read-only afterwards.
///
/// Iteration follows registration order so reports are reproducible.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: IndexMap<ResourceDefRef, ResourceDefinition>,
}

/// An association whose target type is not registered (yet).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingAssociation {
    pub owner: ResourceDefRef,
    pub association: String,
    pub target: ResourceDefRef,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource definition.
    ///
    /// Fails when the type is already present or when it does not mark
    /// exactly one identifying property. Association targets are not checked
    /// here; providers may register in any order.
    pub fn register(&mut self, def: ResourceDefinition) -> Result<(), CatalogError> {
        if self.definitions.contains_key(&def.def) {
            return Err(CatalogError::DuplicateDefinition(def.def));
        }

        let ids: Vec<String> = def
            .properties
            .iter()
            .filter(|p| p.identifier)
            .map(|p| p.name.clone())
            .collect();
        match ids.len() {
            0 => return Err(CatalogError::MissingIdProperty(def.def)),
            1 => {}
            _ => {
                return Err(CatalogError::MultipleIdProperties {
                    def: def.def,
                    names: ids,
                })
            }
        }

        let mut seen = HashSet::new();
        for prop in &def.properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(CatalogError::DuplicateProperty {
                    def: def.def.clone(),
                    name: prop.name.clone(),
                });
            }
        }

        debug!(
            resource_type = %def.def,
            properties = def.properties.len(),
            associations = def.associations.len(),
            "registered resource definition"
        );
        self.definitions.insert(def.def.clone(), def);
        Ok(())
    }

    /// Register every definition in a schema document, stopping at the first error.
    pub fn register_document(&mut self, doc: ResourceSchemaDocument) -> Result<usize, CatalogError> {
        let count = doc.definitions.len();
        for def in doc.definitions {
            self.register(def)?;
        }
        Ok(count)
    }

    pub fn lookup(&self, def: &ResourceDefRef) -> Option<&ResourceDefinition> {
        self.definitions.get(def)
    }

    pub fn contains(&self, def: &ResourceDefRef) -> bool {
        self.definitions.contains_key(def)
    }

    /// All definitions in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.definitions.values()
    }

    pub fn refs(&self) -> impl Iterator<Item = &ResourceDefRef> {
        self.definitions.keys()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Associations pointing at unregistered types. Advisory only: resolution
    /// reports these per resource as unresolved.
    pub fn dangling_associations(&self) -> Vec<DanglingAssociation> {
        self.definitions
            .values()
            .flat_map(|def| {
                def.associations
                    .iter()
                    .filter(|a| !self.definitions.contains_key(&a.target))
                    .map(|a| DanglingAssociation {
                        owner: def.def.clone(),
                        association: a.name.clone(),
                        target: a.target.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Multiplicity, PropertyDescriptor};

    fn instance_ref() -> ResourceDefRef {
        ResourceDefRef::new("aws", "ec2", "instance")
    }

    fn vpc_ref() -> ResourceDefRef {
        ResourceDefRef::new("aws", "ec2", "vpc")
    }

    fn instance_def() -> ResourceDefinition {
        ResourceDefinition::builder(instance_ref())
            .id("instance_id")
            .scalar("ebs_optimized")
            .association("vpc", vpc_ref(), Multiplicity::One)
            .build()
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(instance_def()).unwrap();

        let def = registry.lookup(&instance_ref()).unwrap();
        assert_eq!(def.id_property().unwrap().name, "instance_id");
        assert!(registry.lookup(&vpc_ref()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register(instance_def()).unwrap();
        let err = registry.register(instance_def()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateDefinition(r) if r == instance_ref()));
    }

    #[test]
    fn missing_id_property_fails() {
        let mut registry = Registry::new();
        let def = ResourceDefinition::builder(vpc_ref())
            .scalar("cidr_block")
            .build();
        let err = registry.register(def).unwrap_err();
        assert!(matches!(err, CatalogError::MissingIdProperty(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn two_id_properties_fail() {
        let mut registry = Registry::new();
        let def = ResourceDefinition::builder(vpc_ref())
            .id("vpc_id")
            .id("arn")
            .build();
        let err = registry.register(def).unwrap_err();
        assert!(matches!(err, CatalogError::MultipleIdProperties { names, .. } if names.len() == 2));
    }

    #[test]
    fn duplicate_property_fails() {
        let mut registry = Registry::new();
        let def = ResourceDefinition::builder(vpc_ref())
            .id("vpc_id")
            .property(PropertyDescriptor::scalar("vpc_id"))
            .build();
        assert!(matches!(
            registry.register(def),
            Err(CatalogError::DuplicateProperty { .. })
        ));
    }

    #[test]
    fn list_keeps_registration_order() {
        let mut registry = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(
                    ResourceDefinition::builder(ResourceDefRef::new("aws", "test", name))
                        .id("id")
                        .build(),
                )
                .unwrap();
        }
        let names: Vec<_> = registry.list().map(|d| d.def.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn out_of_order_targets_are_only_advisory() {
        let mut registry = Registry::new();
        registry.register(instance_def()).unwrap();

        let dangling = registry.dangling_associations();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, vpc_ref());

        registry
            .register(ResourceDefinition::builder(vpc_ref()).id("vpc_id").build())
            .unwrap();
        assert!(registry.dangling_associations().is_empty());
    }
}
