//! Provider-facing fetch contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tenet_core::{Resource, ResourceDefRef};
use thiserror::Error;

/// Failure of a provider fetch.
///
/// `Clone` because one cached outcome is handed to every waiter of a
/// single-flight load.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("no loader bound for resource type '{0}'")]
    NoLoader(ResourceDefRef),

    #[error("load cancelled")]
    Cancelled,

    #[error("load timed out after {0:?}")]
    TimedOut(Duration),
}

impl LoadError {
    pub fn provider(err: impl std::fmt::Display) -> Self {
        LoadError::Provider(err.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

/// Fetch interface implemented by provider adapters, one per resource type.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Resource>, LoadError>;

    /// `Ok(None)` when the provider has no resource with this id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Resource>, LoadError>;
}

/// Loader over a fixed in-memory resource list.
///
/// Counts its calls, and can be told to fail or to stall, which makes it the
/// loader of choice for fixtures and tests.
#[derive(Debug, Default)]
pub struct StaticLoader {
    resources: Vec<Resource>,
    failure: Option<String>,
    delay: Option<Duration>,
    get_all_calls: AtomicUsize,
    get_by_id_calls: AtomicUsize,
}

impl StaticLoader {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    /// A loader whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    pub fn get_by_id_calls(&self) -> usize {
        self.get_by_id_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) -> Result<(), LoadError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(LoadError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Loader for StaticLoader {
    async fn get_all(&self) -> Result<Vec<Resource>, LoadError> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        Ok(self.resources.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Resource>, LoadError> {
        self.get_by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        Ok(self.resources.iter().find(|r| r.id == id).cloned())
    }
}
