use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use happytaps_core::domain::business::Business;
use happytaps_core::domain::cache::CacheEntry;
use happytaps_core::domain::location::LocationKey;

pub mod location_cache;
pub mod memory;

pub use location_cache::{CacheInventory, SqlLocationCacheRepository};
pub use memory::InMemoryLocationCacheRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

/// Durable location-keyed store of directory snapshots.
///
/// `get` treats absence as a normal outcome. Freshness is the caller's concern; the store
/// only records `fetched_at`.
#[async_trait]
pub trait LocationCacheRepository: Send + Sync {
    async fn get(&self, key: &LocationKey) -> Result<Option<CacheEntry>, RepositoryError>;

    /// Replaces any prior entry for `entry.location_key` in one write.
    async fn save_entry(&self, entry: CacheEntry) -> Result<(), RepositoryError>;

    /// Stores `businesses` for `key`, stamped with the current UTC time.
    async fn put(
        &self,
        key: &LocationKey,
        businesses: Vec<Business>,
    ) -> Result<CacheEntry, RepositoryError> {
        let entry = CacheEntry { location_key: key.clone(), businesses, fetched_at: Utc::now() };
        self.save_entry(entry.clone()).await?;
        Ok(entry)
    }
}
