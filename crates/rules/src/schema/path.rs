//! Dotted property paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A dotted path such as `vpc.cidr_block` or `perm.ip_ranges`.
///
/// Each segment names a property, an association (followed through the
/// store) or, for the first segment only, a quantifier variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Lenient constructor: empty segments are dropped.
    pub fn from_dotted(s: &str) -> Self {
        Self {
            segments: s
                .split('.')
                .map(str::trim)
                .filter(|seg| !seg.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for PropertyPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.trim().split('.').map(str::to_string).collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(format!("invalid property path: '{s}'"));
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PropertyPath> for String {
    fn from(path: PropertyPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
