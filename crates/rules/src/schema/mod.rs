//! Spec document types with serde deserialization.
//!
//! - `SpecDocument`: one YAML file (apiVersion, kind, metadata, root group)
//! - `Group` / `Node` / `Rule`: the spec tree
//! - `Expr`: filter and assertion expressions over resource properties

mod expr;
mod metadata;
mod path;
mod spec;

pub use expr::*;
pub use metadata::*;
pub use path::*;
pub use spec::*;

#[cfg(test)]
mod tests;
