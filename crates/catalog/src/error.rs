use std::path::PathBuf;

use tenet_core::ResourceDefRef;
use thiserror::Error;

/// Configuration errors raised while populating a [`Registry`](crate::Registry).
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("resource type '{0}' is already registered")]
    DuplicateDefinition(ResourceDefRef),

    #[error("resource type '{0}' has no identifying property")]
    MissingIdProperty(ResourceDefRef),

    #[error("resource type '{def}' marks more than one identifying property: {names:?}")]
    MultipleIdProperties {
        def: ResourceDefRef,
        names: Vec<String>,
    },

    #[error("resource type '{def}' declares property '{name}' twice")]
    DuplicateProperty { def: ResourceDefRef, name: String },

    #[error("invalid schema document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
