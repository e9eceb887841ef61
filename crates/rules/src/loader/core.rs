//! [`SpecLoader`]: spec documents from a file or a directory tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::schema::{CommonMetadata, Group, Node, Spec, SpecDocument};

use super::error::{LoadResult, LoadStatus, Result, SpecError};

const API_VERSION: &str = "v1";
const KIND: &str = "Spec";

/// Header-only first pass, so a wrong `kind` is reported as such rather
/// than as whatever field the full parse trips over first.
#[derive(Debug, Deserialize)]
struct SpecEnvelope {
    #[serde(rename = "apiVersion")]
    api_version: String,
    kind: String,
    metadata: CommonMetadata,
}

pub struct SpecLoader {
    root: PathBuf,
}

impl SpecLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the spec tree rooted at the loader's path.
    ///
    /// A file yields its own root group and any failure is an error. A
    /// directory is scanned recursively in path order; dotfiles and
    /// non-YAML files are skipped, and per-file failures are reported in
    /// the returned results without aborting the scan.
    pub fn load(&self) -> Result<(Spec, Vec<LoadResult>)> {
        if self.root.is_file() {
            let doc = Self::load_file(&self.root)?;
            let status = LoadStatus::Loaded {
                spec_id: doc.metadata.id.clone(),
                rules: doc.spec.rules().len(),
            };
            let results = vec![LoadResult {
                path: self.root.clone(),
                status,
            }];
            return Ok((doc.spec, results));
        }

        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("spec")
            .to_string();
        let mut root = Group::new(name);
        let mut results = Vec::new();
        let mut ids = HashSet::new();
        self.scan_dir(&self.root, &mut root, &mut ids, &mut results)?;
        Ok((root, results))
    }

    fn scan_dir(
        &self,
        dir: &Path,
        root: &mut Group,
        ids: &mut HashSet<String>,
        results: &mut Vec<LoadResult>,
    ) -> Result<()> {
        let mut paths = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
            {
                if path.is_file() {
                    results.push(skipped(path, "dotfile"));
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir(&path, root, ids, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yml" || e == "yaml");
            if !is_yaml {
                results.push(skipped(path, "not a YAML file"));
                continue;
            }

            match Self::load_file(&path) {
                Ok(doc) if !doc.metadata.enabled => {
                    info!(spec_id = %doc.metadata.id, path = %path.display(), "skipping disabled spec");
                    results.push(skipped(path, "disabled"));
                }
                Ok(doc) if !ids.insert(doc.metadata.id.clone()) => {
                    let error = format!("duplicate spec id '{}'", doc.metadata.id);
                    warn!(path = %path.display(), %error, "failed to load spec file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed { error },
                    });
                }
                Ok(doc) => {
                    let spec_id = doc.metadata.id.clone();
                    let rules = doc.spec.rules().len();
                    info!(%spec_id, rules, path = %path.display(), "loaded spec");
                    root.children.push(Node::Group(doc.spec));
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { spec_id, rules },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load spec file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed { error: e.to_string() },
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse one spec file: header first, then the full document.
    pub fn load_file(path: &Path) -> Result<SpecDocument> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<SpecDocument> {
        let envelope: SpecEnvelope = serde_yaml::from_str(contents)?;
        if envelope.api_version != API_VERSION {
            return Err(SpecError::Validation(format!(
                "apiVersion must be '{API_VERSION}', got '{}'",
                envelope.api_version
            )));
        }
        if envelope.kind != KIND {
            return Err(SpecError::Validation(format!(
                "kind must be '{KIND}', got '{}'",
                envelope.kind
            )));
        }
        if envelope.metadata.id.trim().is_empty() {
            return Err(SpecError::Validation("spec metadata.id must not be empty".to_string()));
        }

        serde_yaml::from_str(contents).map_err(|e| {
            SpecError::Validation(format!("failed to parse spec '{}': {e}", envelope.metadata.id))
        })
    }
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}
