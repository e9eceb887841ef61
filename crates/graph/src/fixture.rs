//! File-backed provider: resource schemas from YAML, resources from JSON.
//!
//! Each registered type `provider.group.name` reads its resources from
//! `<fixtures_dir>/provider.group.name.json`, a JSON array of objects. The
//! definition's identifying property supplies each resource id.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tenet_catalog::{Registry, ResourceDefinition, ResourceSchemaDocument};
use tenet_core::{Resource, Value};
use tracing::{debug, info};

use crate::bindings::{LoaderTable, ProviderError, ProviderModule};
use crate::loader::StaticLoader;

const PROVIDER_NAME: &str = "fixtures";

#[derive(Debug, Clone)]
pub struct FixtureProvider {
    schema_dir: PathBuf,
    fixtures_dir: PathBuf,
}

impl FixtureProvider {
    pub fn new(schema_dir: impl Into<PathBuf>, fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            fixtures_dir: fixtures_dir.into(),
        }
    }

    fn setup_error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Setup {
            provider: PROVIDER_NAME.to_string(),
            message: message.into(),
        }
    }

    /// Resources of one type, or an empty list when no fixture file exists.
    fn read_resources(&self, def: &ResourceDefinition) -> Result<Vec<Resource>, ProviderError> {
        let path = fixture_path(&self.fixtures_dir, def);
        if !path.is_file() {
            debug!(resource_type = %def.def, path = %path.display(), "no fixture file");
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| self.setup_error(format!("{}: {e}", path.display())))?;
        parse_fixture(def, &contents).map_err(|message| self.setup_error(format!("{}: {message}", path.display())))
    }
}

impl ProviderModule for FixtureProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn install(&self, registry: &mut Registry, loaders: &mut LoaderTable) -> Result<(), ProviderError> {
        for (path, doc) in ResourceSchemaDocument::load_dir(&self.schema_dir)? {
            let definitions = doc.definitions.clone();
            registry.register_document(doc)?;
            for def in &definitions {
                let resources = self.read_resources(def)?;
                info!(
                    resource_type = %def.def,
                    schema = %path.display(),
                    count = resources.len(),
                    "bound fixture loader"
                );
                loaders.bind(def.def.clone(), Arc::new(StaticLoader::new(resources)))?;
            }
        }
        Ok(())
    }
}

/// Parse one fixture file: a JSON array of objects keyed by property name.
pub fn parse_fixture(def: &ResourceDefinition, contents: &str) -> Result<Vec<Resource>, String> {
    let json: serde_json::Value = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    let serde_json::Value::Array(items) = json else {
        return Err("expected a JSON array of resources".to_string());
    };
    let id_name = def
        .id_property()
        .map(|p| p.name.as_str())
        .ok_or_else(|| format!("resource type '{}' has no identifying property", def.def))?;

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let serde_json::Value::Object(map) = item else {
                return Err(format!("entry {i} is not an object"));
            };
            // The id is taken verbatim, before values are typed by shape.
            let id = match map.get(id_name) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => return Err(format!("entry {i} has no '{id_name}'")),
            };
            let mut fields: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect();
            fields.insert(id_name.to_string(), Value::String(id.clone()));
            let mut resource = Resource::new(def.def.clone(), id);
            resource.fields = fields;
            Ok(resource)
        })
        .collect()
}

/// Where the fixture file of `def` lives.
pub fn fixture_path(fixtures_dir: &Path, def: &ResourceDefinition) -> PathBuf {
    fixtures_dir.join(format!("{}.json", def.def))
}
