//! Compliance rule engine over the resource graph.
//!
//! This crate provides:
//! - The predicate library (equality, ordering, date, IP/CIDR, quantifiers)
//! - YAML spec documents: groups of rules with filter/assert expressions
//! - A filesystem spec loader
//! - Pre-flight validation of a spec against the resource registry
//! - The spec evaluator producing a pass/fail/error/unresolved result tree

pub mod evaluator;
pub mod loader;
pub mod predicates;
pub mod schema;
pub mod validation;

pub use evaluator::{EvalOptions, Report, SpecEvaluator, Status};
pub use loader::SpecLoader;
pub use validation::validate_spec;
