// # Memory Cache Store
//
// In-memory implementation of CacheStore.
//
// ## Purpose
//
// Nothing survives the process, so every invocation that uses it behaves
// like a first run and updates each detected version. Useful for tests and
// for embedding the reconciler where the caller keeps its own history.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::address::IpVersion;
use crate::traits::cache_store::CacheStore;

/// In-memory cache store implementation
///
/// Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<HashMap<IpVersion, String>>>,
}

impl MemoryCacheStore {
    /// Create a new empty memory cache store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a pre-filled slot
    pub fn with_value(version: IpVersion, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(version, value.into());
        Self {
            inner: Arc::new(RwLock::new(slots)),
        }
    }

    /// Check if every slot is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, version: IpVersion) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(&version).cloned())
    }

    async fn write(&self, version: IpVersion, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(version, value.to_string());
        Ok(())
    }
}
