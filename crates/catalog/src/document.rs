//! `ResourceSchema` YAML documents: resource definitions shipped as data.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::definition::ResourceDefinition;
use crate::error::CatalogError;

pub const SCHEMA_API_VERSION: &str = "v1";
pub const SCHEMA_KIND: &str = "ResourceSchema";

/// Top-level ResourceSchema document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceSchemaDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    /// Provider the definitions belong to (informational).
    #[serde(default)]
    pub provider: Option<String>,
    pub definitions: Vec<ResourceDefinition>,
}

impl ResourceSchemaDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let doc: Self = serde_yaml::from_str(yaml)?;
        Ok(doc)
    }

    /// Parse and check the header of a single schema file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let doc = Self::from_yaml(&contents)?;
        doc.check_header(path)?;
        Ok(doc)
    }

    /// Load every `*.yml` / `*.yaml` schema in `dir` (recursively), sorted by
    /// path so registration order is stable. Dotfiles are skipped.
    pub fn load_dir(dir: &Path) -> Result<Vec<(PathBuf, Self)>, CatalogError> {
        let mut paths = Vec::new();
        collect_yaml(dir, &mut paths)?;
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            let doc = Self::from_file(&path)?;
            debug!(path = %path.display(), definitions = doc.definitions.len(), "loaded schema document");
            docs.push((path, doc));
        }
        info!(dir = %dir.display(), documents = docs.len(), "loaded resource schemas");
        Ok(docs)
    }

    fn check_header(&self, path: &Path) -> Result<(), CatalogError> {
        if self.api_version != SCHEMA_API_VERSION {
            return Err(CatalogError::InvalidDocument {
                path: path.to_path_buf(),
                message: format!("apiVersion must be '{SCHEMA_API_VERSION}', got '{}'", self.api_version),
            });
        }
        if self.kind != SCHEMA_KIND {
            return Err(CatalogError::InvalidDocument {
                path: path.to_path_buf(),
                message: format!("kind must be '{SCHEMA_KIND}', got '{}'", self.kind),
            });
        }
        Ok(())
    }
}

fn collect_yaml(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_yaml(&path, out)?;
            continue;
        }
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "yml" || e == "yaml")
            .unwrap_or(false);
        if is_yaml {
            out.push(path);
        }
    }
    Ok(())
}
