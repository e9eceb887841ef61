//! Per-run resource cache over provider loaders.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tenet_catalog::Registry;
use tenet_core::{Resource, ResourceDefRef};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::bindings::LoaderTable;
use crate::loader::LoadError;
use crate::normalize::normalize_resource;

type LoadOutcome<T> = Result<T, LoadError>;
type IdCell = Arc<OnceCell<LoadOutcome<Option<Arc<Resource>>>>>;

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Upper bound for one provider call.
    pub load_timeout: Option<Duration>,
}

/// Everything loaded for one resource type, indexed by id.
#[derive(Debug, Default)]
pub struct Snapshot {
    resources: Vec<Arc<Resource>>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    fn new(resources: Vec<Arc<Resource>>) -> Self {
        let index = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { resources, index }
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    pub fn get(&self, id: &str) -> Option<Arc<Resource>> {
        self.index.get(id).map(|&i| Arc::clone(&self.resources[i]))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Cache cells of one resource type. Each cell is initialized at most once.
#[derive(Default)]
struct TypeCache {
    all: OnceCell<LoadOutcome<Arc<Snapshot>>>,
    by_id: Mutex<HashMap<String, IdCell>>,
}

impl TypeCache {
    fn id_cell(&self, id: &str) -> IdCell {
        let mut cells = self.by_id.lock().expect("id cache lock poisoned");
        Arc::clone(cells.entry(id.to_string()).or_default())
    }

    /// Resources already fetched one by one.
    fn memoized(&self) -> HashMap<String, Arc<Resource>> {
        let cells = self.by_id.lock().expect("id cache lock poisoned");
        cells
            .iter()
            .filter_map(|(id, cell)| match cell.get() {
                Some(Ok(Some(r))) => Some((id.clone(), Arc::clone(r))),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Counters {
    get_all_calls: AtomicU64,
    get_by_id_calls: AtomicU64,
    cache_hits: AtomicU64,
}

/// Provider call and cache counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub get_all_calls: u64,
    pub get_by_id_calls: u64,
    pub cache_hits: u64,
}

/// Run-scoped resource store.
///
/// Every `(type)` and `(type, id)` is fetched at most once; concurrent first
/// callers share the single in-flight fetch. Outcomes, failures included,
/// are immutable for the rest of the run. Locks are per type and only held
/// to look up a cell, never across a provider call.
pub struct ResourceStore {
    registry: Arc<Registry>,
    loaders: LoaderTable,
    options: StoreOptions,
    cancel: CancellationToken,
    types: Mutex<HashMap<ResourceDefRef, Arc<TypeCache>>>,
    counters: Counters,
}

impl ResourceStore {
    pub fn new(registry: Arc<Registry>, loaders: LoaderTable) -> Self {
        Self::with_options(registry, loaders, StoreOptions::default(), CancellationToken::new())
    }

    pub fn with_options(
        registry: Arc<Registry>,
        loaders: LoaderTable,
        options: StoreOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            loaders,
            options,
            cancel,
            types: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Token that aborts in-flight and future loads of this run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            get_all_calls: self.counters.get_all_calls.load(Ordering::Relaxed),
            get_by_id_calls: self.counters.get_by_id_calls.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
        }
    }

    fn type_cache(&self, def: &ResourceDefRef) -> Arc<TypeCache> {
        let mut types = self.types.lock().expect("type cache lock poisoned");
        Arc::clone(types.entry(def.clone()).or_default())
    }

    /// All resources of a type. The first call loads and caches the full
    /// list; later calls are served from the cache.
    pub async fn all(&self, def: &ResourceDefRef) -> LoadOutcome<Arc<Snapshot>> {
        let cache = self.type_cache(def);
        if let Some(outcome) = cache.all.get() {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            trace!(resource_type = %def, "snapshot cache hit");
            return outcome.clone();
        }
        cache
            .all
            .get_or_init(|| self.fetch_all(def, &cache))
            .await
            .clone()
    }

    /// One resource by id. The first answer for an id is memoized and wins
    /// for the rest of the run. It comes from the type snapshot when that is
    /// loaded, otherwise from the loader.
    pub async fn by_id(&self, def: &ResourceDefRef, id: &str) -> LoadOutcome<Option<Arc<Resource>>> {
        let cache = self.type_cache(def);
        let cell = cache.id_cell(id);
        if let Some(outcome) = cell.get() {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return outcome.clone();
        }

        match cache.all.get() {
            Some(Ok(snapshot)) => {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                let snapshot = Arc::clone(snapshot);
                cell.get_or_init(|| async move { Ok(snapshot.get(id)) })
                    .await
                    .clone()
            }
            // A failed listing does not decide lookups by id.
            _ => cell.get_or_init(|| self.fetch_one(def, id)).await.clone(),
        }
    }

    async fn fetch_all(&self, def: &ResourceDefRef, cache: &TypeCache) -> LoadOutcome<Arc<Snapshot>> {
        let loader = self
            .loaders
            .get(def)
            .ok_or_else(|| LoadError::NoLoader(def.clone()))?;

        self.counters.get_all_calls.fetch_add(1, Ordering::Relaxed);
        let loaded = match self.guarded(loader.get_all()).await {
            Ok(list) => list,
            Err(e) => {
                warn!(resource_type = %def, error = %e, "failed to load resources");
                return Err(e);
            }
        };

        // Resources already handed out by id keep their identity.
        let mut memoized = cache.memoized();
        let definition = self.registry.lookup(def);
        let mut resources: Vec<Arc<Resource>> = loaded
            .into_iter()
            .map(|r| match memoized.remove(&r.id) {
                Some(seen) => seen,
                None => Arc::new(match definition {
                    Some(d) => normalize_resource(d, r),
                    None => r,
                }),
            })
            .collect();

        // Found by id but absent from the listing: still part of the snapshot.
        let mut unlisted: Vec<Arc<Resource>> = memoized.into_values().collect();
        if !unlisted.is_empty() {
            unlisted.sort_by(|a, b| a.id.cmp(&b.id));
            debug!(resource_type = %def, count = unlisted.len(), "keeping resources missing from listing");
            resources.extend(unlisted);
        }

        info!(resource_type = %def, count = resources.len(), "loaded resources");
        Ok(Arc::new(Snapshot::new(resources)))
    }

    async fn fetch_one(&self, def: &ResourceDefRef, id: &str) -> LoadOutcome<Option<Arc<Resource>>> {
        let loader = self
            .loaders
            .get(def)
            .ok_or_else(|| LoadError::NoLoader(def.clone()))?;

        self.counters.get_by_id_calls.fetch_add(1, Ordering::Relaxed);
        let found = self.guarded(loader.get_by_id(id)).await.map_err(|e| {
            warn!(resource_type = %def, id, error = %e, "failed to load resource");
            e
        })?;

        let definition = self.registry.lookup(def);
        Ok(found.map(|r| {
            Arc::new(match definition {
                Some(d) => normalize_resource(d, r),
                None => r,
            })
        }))
    }

    /// Apply the run's cancellation token and the per-call timeout.
    async fn guarded<T, F>(&self, call: F) -> LoadOutcome<T>
    where
        F: Future<Output = LoadOutcome<T>>,
    {
        let timed = async {
            match self.options.load_timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(LoadError::TimedOut(limit)),
                },
                None => call.await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LoadError::Cancelled),
            outcome = timed => outcome,
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
