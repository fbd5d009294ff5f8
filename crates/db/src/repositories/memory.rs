use std::collections::HashMap;

use tokio::sync::RwLock;

use happytaps_core::domain::cache::CacheEntry;
use happytaps_core::domain::location::LocationKey;

use super::{LocationCacheRepository, RepositoryError};

/// Process-local cache store; snapshots are swapped under a write lock so readers never see a
/// partially replaced list.
#[derive(Default)]
pub struct InMemoryLocationCacheRepository {
    entries: RwLock<HashMap<LocationKey, CacheEntry>>,
}

impl InMemoryLocationCacheRepository {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl LocationCacheRepository for InMemoryLocationCacheRepository {
    async fn get(&self, key: &LocationKey) -> Result<Option<CacheEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn save_entry(&self, entry: CacheEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.location_key.clone(), entry);
        Ok(())
    }
}
