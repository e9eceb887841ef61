//! Loader bindings and the provider-module seam.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tenet_catalog::{CatalogError, Registry};
use tenet_core::ResourceDefRef;
use thiserror::Error;
use tracing::{info, warn};

use crate::loader::Loader;

/// Startup failures while installing provider modules. Fatal.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("a loader is already bound for resource type '{0}'")]
    DuplicateLoader(ResourceDefRef),

    #[error("provider '{provider}' failed to initialize: {message}")]
    Setup { provider: String, message: String },
}

/// Exactly one loader per resource type.
#[derive(Clone, Default)]
pub struct LoaderTable {
    loaders: HashMap<ResourceDefRef, Arc<dyn Loader>>,
}

impl fmt::Debug for LoaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.loaders.keys()).finish()
    }
}

impl LoaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, def: ResourceDefRef, loader: Arc<dyn Loader>) -> Result<(), ProviderError> {
        if self.loaders.contains_key(&def) {
            return Err(ProviderError::DuplicateLoader(def));
        }
        self.loaders.insert(def, loader);
        Ok(())
    }

    pub fn get(&self, def: &ResourceDefRef) -> Option<Arc<dyn Loader>> {
        self.loaders.get(def).cloned()
    }

    pub fn contains(&self, def: &ResourceDefRef) -> bool {
        self.loaders.contains_key(def)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// A provider (one cloud, one account kind, a fixture set...) that registers
/// its resource types and binds a loader for each.
pub trait ProviderModule {
    fn name(&self) -> &str;

    fn install(&self, registry: &mut Registry, loaders: &mut LoaderTable) -> Result<(), ProviderError>;
}

/// Run every provider module once and return the populated registry and
/// loader table. Any error aborts startup.
pub fn install_providers<'a, I>(modules: I) -> Result<(Registry, LoaderTable), ProviderError>
where
    I: IntoIterator<Item = &'a dyn ProviderModule>,
{
    let mut registry = Registry::new();
    let mut loaders = LoaderTable::new();

    for module in modules {
        let before = registry.len();
        module.install(&mut registry, &mut loaders)?;
        info!(
            provider = module.name(),
            resource_types = registry.len() - before,
            "installed provider"
        );
    }

    for def in registry.refs() {
        if !loaders.contains(def) {
            warn!(resource_type = %def, "resource type registered without a loader");
        }
    }
    for dangling in registry.dangling_associations() {
        warn!(
            owner = %dangling.owner,
            association = %dangling.association,
            target = %dangling.target,
            "association target is not registered"
        );
    }

    Ok((registry, loaders))
}
