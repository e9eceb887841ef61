//! Filesystem spec loader.
//!
//! Reads `kind: Spec` YAML documents from a single file or recursively from
//! a directory, reporting a [`LoadResult`] per file. A directory becomes one
//! root group whose children are the per-file groups.

mod core;
mod error;


pub use self::core::SpecLoader;
pub use self::error::{LoadResult, LoadStatus, Result, SpecError};
