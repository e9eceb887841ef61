//! Pre-flight validation of a spec tree against the registry.
//!
//! Returns a [`ValidationResult`] with errors (block evaluation) and
//! warnings (advisory). Evaluation itself never needs validation: it
//! reports whatever it meets at run time.

pub mod fuzzy;
mod spec_checks;

use serde::{Deserialize, Serialize};
use tenet_catalog::Registry;

use crate::schema::Spec;

// ── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location in the tree, e.g. `ec2/network/no-open-ssh.assert`.
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push_error(path.into(), message.into(), None);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.push_error(path.into(), message.into(), suggestion);
    }

    fn push_error(&mut self, path: String, message: String, suggestion: Option<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path,
            message,
            suggestion,
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Check a spec tree: resource types exist, rule ids are unique, paths
/// start from something the resource type has, and quantifier variables
/// do not shadow each other.
pub fn validate_spec(spec: &Spec, registry: &Registry) -> ValidationResult {
    let mut result = ValidationResult::new();
    spec_checks::validate_tree(spec, registry, &mut result);
    result
}
