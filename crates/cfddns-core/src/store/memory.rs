// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// Holds the document in a RwLock and counts how often it was persisted.
// Useful for tests and for embedders that keep the configuration elsewhere
// and only want the engine's decision about whether it changed.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::Configuration;
use crate::traits::config_store::ConfigStore;

/// In-memory config store
///
/// Clones share the same document and counter.
#[derive(Debug, Clone)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<Option<Configuration>>>,
    persist_count: Arc<AtomicUsize>,
}

impl MemoryConfigStore {
    /// Create a store holding `config`
    pub fn new(config: Configuration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(config))),
            persist_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a store with no document; `load` fails until one is persisted
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            persist_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `persist` was called
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    /// Current stored document
    pub async fn snapshot(&self) -> Option<Configuration> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Configuration, Error> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::config("no configuration stored"))
    }

    async fn persist(&self, config: &Configuration) -> Result<(), Error> {
        *self.inner.write().await = Some(config.clone());
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
