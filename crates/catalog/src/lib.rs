//! Resource definition registry.
//!
//! Provider modules describe each resource type they support (properties,
//! identifying property, associations) and register it here once at startup.
//! After population the registry is read-only and shared behind an `Arc`.

pub mod definition;
pub mod document;
pub mod error;
pub mod registry;

pub use definition::{
    AssociationDescriptor, DefinitionBuilder, ElementKind, Multiplicity, PropertyDescriptor,
    ResourceDefinition, ValueKind,
};
pub use document::ResourceSchemaDocument;
pub use error::CatalogError;
pub use registry::{DanglingAssociation, Registry};
