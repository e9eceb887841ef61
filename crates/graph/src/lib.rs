//! Resource store and association resolver.
//!
//! Provider loaders are bound per resource type into a [`LoaderTable`]; a
//! [`ResourceStore`] wraps them for one evaluation run, caching every load
//! behind single-flight cells so each `(type)` and `(type, id)` is fetched at
//! most once and every reader observes the same snapshot.

pub mod bindings;
pub mod fixture;
pub mod loader;
pub mod normalize;
pub mod resolver;
pub mod store;

pub use bindings::{install_providers, LoaderTable, ProviderError, ProviderModule};
pub use fixture::FixtureProvider;
pub use loader::{LoadError, Loader, StaticLoader};
pub use normalize::normalize_resource;
pub use resolver::{association_ids, Resolution, UnresolvedReason, UnresolvedRef};
pub use store::{ResourceStore, Snapshot, StoreOptions, StoreStats};
