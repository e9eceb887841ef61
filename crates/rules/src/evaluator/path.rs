//! Property path resolution across nested records and associations.

use std::sync::Arc;

use tenet_catalog::{Multiplicity, ResourceDefinition};
use tenet_core::{Resource, Value};
use tenet_graph::{LoadError, UnresolvedRef};

use super::expr::{ExprContext, Scope};
use crate::schema::PropertyPath;

/// Position reached while walking a path.
#[derive(Debug, Clone)]
pub(crate) enum Cursor {
    Resource(Arc<Resource>),
    Value(Value),
}

impl Cursor {
    /// As a comparable value. A resource stands for its id.
    pub fn into_value(self) -> Value {
        match self {
            Cursor::Resource(r) => Value::Ref(r.id.clone()),
            Cursor::Value(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathMode {
    /// The last segment is read as a raw field; an association yields its ids.
    Operand,
    /// The last segment is followed too, so elements are the target resources.
    Collection,
}

#[derive(Debug, Default)]
pub(crate) struct Resolved {
    cursors: Vec<Cursor>,
    /// A many-association or a list was crossed: the path names several values.
    fanned_out: bool,
    pub unresolved: Vec<UnresolvedRef>,
}

impl Resolved {
    pub fn into_value(self) -> Value {
        if self.fanned_out {
            Value::List(self.cursors.into_iter().map(Cursor::into_value).collect())
        } else {
            self.cursors
                .into_iter()
                .next()
                .map(Cursor::into_value)
                .unwrap_or_default()
        }
    }

    pub fn into_elements(self) -> Vec<Cursor> {
        let mut elements = Vec::new();
        for cursor in self.cursors {
            match cursor {
                Cursor::Value(v) => elements.extend(expand(v)),
                resource => elements.push(resource),
            }
        }
        elements
    }
}

/// Elements of a collection value. Null is empty, a scalar is a singleton.
pub(crate) fn expand(value: Value) -> Vec<Cursor> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.into_iter().map(Cursor::Value).collect(),
        Value::RefList(ids) => ids.into_iter().map(|id| Cursor::Value(Value::Ref(id))).collect(),
        other => vec![Cursor::Value(other)],
    }
}

fn field_of(resource: &Resource, definition: Option<&ResourceDefinition>, name: &str) -> Value {
    if let Some(value) = resource.get(name) {
        return value.clone();
    }
    match definition.and_then(|d| d.id_property()) {
        Some(id) if id.name == name => Value::String(resource.id.clone()),
        _ => Value::Null,
    }
}

impl ExprContext<'_> {
    /// Walk `path` from the scope. A first segment naming a bound variable
    /// starts from that variable, anything else from the rule's resource.
    pub(crate) async fn resolve(
        &self,
        path: &PropertyPath,
        scope: &Scope,
        mode: PathMode,
    ) -> Result<Resolved, LoadError> {
        let segments = path.segments();
        let (mut cursors, rest) = match path.head().and_then(|head| scope.lookup(head)) {
            Some(bound) => (vec![bound.clone()], &segments[1..]),
            None => (vec![Cursor::Resource(Arc::clone(scope.resource()))], segments),
        };

        let mut resolved = Resolved::default();
        for (i, segment) in rest.iter().enumerate() {
            let follow = i + 1 < rest.len() || mode == PathMode::Collection;
            let mut next = Vec::with_capacity(cursors.len());

            for cursor in cursors {
                match cursor {
                    Cursor::Resource(resource) => {
                        let definition = self.registry.lookup(&resource.def);
                        match definition.and_then(|d| d.association(segment)) {
                            Some(assoc) if follow => {
                                let resolution = self.store.resolve_association(&resource, assoc).await?;
                                if assoc.multiplicity == Multiplicity::Many {
                                    resolved.fanned_out = true;
                                }
                                next.extend(resolution.resources.into_iter().map(Cursor::Resource));
                                resolved.unresolved.extend(resolution.unresolved);
                            }
                            _ => next.push(Cursor::Value(field_of(&resource, definition, segment))),
                        }
                    }
                    Cursor::Value(Value::List(items)) => {
                        resolved.fanned_out = true;
                        next.extend(
                            items
                                .iter()
                                .map(|item| Cursor::Value(item.field(segment).cloned().unwrap_or_default())),
                        );
                    }
                    Cursor::Value(value) => {
                        next.push(Cursor::Value(value.field(segment).cloned().unwrap_or_default()));
                    }
                }
            }
            cursors = next;
        }

        resolved.cursors = cursors;
        Ok(resolved)
    }
}
