use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

/// Globally unique key for a resource type: `(provider, group, name)`.
///
/// Renders and parses as the dotted form `aws.ec2.instance`, which is also
/// its serialized representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceDefRef {
    pub provider: String,
    pub group: String,
    pub name: String,
}

impl ResourceDefRef {
    pub fn new(
        provider: impl Into<String>,
        group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceDefRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.provider, self.group, self.name)
    }
}

impl FromStr for ResourceDefRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(g), Some(n), None)
                if !p.is_empty() && !g.is_empty() && !n.is_empty() =>
            {
                Ok(Self::new(p, g, n))
            }
            _ => Err(CoreError::InvalidDefRef(s.to_string())),
        }
    }
}

impl TryFrom<String> for ResourceDefRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceDefRef> for String {
    fn from(value: ResourceDefRef) -> Self {
        value.to_string()
    }
}

/// One loaded instance of a resource type.
///
/// Produced by a provider loader and never mutated once the store has
/// cached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub def: ResourceDefRef,
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Resource {
    pub fn new(def: ResourceDefRef, id: impl Into<String>) -> Self {
        Self {
            def,
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Field value, `None` when the loader did not set it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Render the resource as a nested record (id included).
    pub fn to_record(&self) -> Value {
        let mut fields = self.fields.clone();
        fields
            .entry("id".to_string())
            .or_insert_with(|| Value::String(self.id.clone()));
        Value::Record(fields)
    }
}

/// Free-form provider tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<KeyValue> for Value {
    fn from(kv: KeyValue) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), Value::String(kv.key));
        fields.insert("value".to_string(), Value::String(kv.value));
        Value::Record(fields)
    }
}
