//! Association resolution: foreign-key ids to target resources.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tenet_catalog::AssociationDescriptor;
use tenet_core::{Resource, ResourceDefRef, Value};

use crate::loader::LoadError;
use crate::store::ResourceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No resource of the target type has this id.
    NotFound,
    /// The association's target type is not registered.
    UnknownTarget,
}

/// An association edge that could not be followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    pub target: ResourceDefRef,
    pub id: String,
    pub reason: UnresolvedReason,
}

/// Outcome of following one association from one owner.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved targets, in the order their ids appear on the owner.
    pub resources: Vec<Arc<Resource>>,
    pub unresolved: Vec<UnresolvedRef>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Ids held by an association field. Absent and null fields hold none.
pub fn association_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Ref(id)) | Some(Value::String(id)) => {
            if id.is_empty() {
                Vec::new()
            } else {
                vec![id.clone()]
            }
        }
        Some(Value::RefList(ids)) => ids.clone(),
        Some(Value::List(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Number(n)) => vec![Value::Number(*n).to_string()],
        Some(_) => Vec::new(),
    }
}

impl ResourceStore {
    /// Follow `assoc` from `owner`. Best effort: ids that do not resolve are
    /// reported as [`UnresolvedRef`]s, only provider failures are errors.
    pub async fn resolve_association(
        &self,
        owner: &Resource,
        assoc: &AssociationDescriptor,
    ) -> Result<Resolution, LoadError> {
        let ids = association_ids(owner.get(&assoc.name));
        if ids.is_empty() {
            return Ok(Resolution::default());
        }

        if !self.registry().contains(&assoc.target) {
            return Ok(Resolution {
                resources: Vec::new(),
                unresolved: ids
                    .into_iter()
                    .map(|id| UnresolvedRef {
                        target: assoc.target.clone(),
                        id,
                        reason: UnresolvedReason::UnknownTarget,
                    })
                    .collect(),
            });
        }

        let lookups = join_all(ids.iter().map(|id| self.by_id(&assoc.target, id))).await;

        let mut resolution = Resolution::default();
        for (id, found) in ids.into_iter().zip(lookups) {
            match found? {
                Some(resource) => resolution.resources.push(resource),
                None => resolution.unresolved.push(UnresolvedRef {
                    target: assoc.target.clone(),
                    id,
                    reason: UnresolvedReason::NotFound,
                }),
            }
        }
        Ok(resolution)
    }
}
