use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use happytaps_core::domain::business::Business;
use happytaps_core::domain::cache::CacheEntry;
use happytaps_core::domain::location::LocationKey;

use super::{LocationCacheRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLocationCacheRepository {
    pool: DbPool,
}

/// Row counts reported by operator tooling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheInventory {
    pub entries: usize,
    pub fresh: usize,
}

impl SqlLocationCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Counts stored snapshots and how many are still inside `window`. Unparseable
    /// timestamps count as stale.
    pub async fn inventory(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<CacheInventory, RepositoryError> {
        let stamps: Vec<(String,)> = sqlx::query_as("SELECT fetched_at FROM location_cache")
            .fetch_all(&self.pool)
            .await?;

        let fresh = stamps
            .iter()
            .filter_map(|(raw,)| DateTime::parse_from_rfc3339(raw).ok())
            .filter(|fetched_at| now - fetched_at.with_timezone(&Utc) < window)
            .count();

        Ok(CacheInventory { entries: stamps.len(), fresh })
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<CacheEntry, RepositoryError> {
    let location_key: String =
        row.try_get("location_key").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let businesses_json: String =
        row.try_get("businesses_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let fetched_at_str: String =
        row.try_get("fetched_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let businesses: Vec<Business> = serde_json::from_str(&businesses_json).map_err(|e| {
        RepositoryError::Decode(format!("businesses for `{location_key}`: {e}"))
    })?;
    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("fetched_at for `{location_key}`: {e}")))?;

    Ok(CacheEntry { location_key: LocationKey(location_key), businesses, fetched_at })
}

#[async_trait::async_trait]
impl LocationCacheRepository for SqlLocationCacheRepository {
    async fn get(&self, key: &LocationKey) -> Result<Option<CacheEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT location_key, businesses_json, fetched_at
             FROM location_cache WHERE location_key = ?",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    async fn save_entry(&self, entry: CacheEntry) -> Result<(), RepositoryError> {
        let businesses_json = serde_json::to_string(&entry.businesses)
            .map_err(|e| RepositoryError::Encode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO location_cache (location_key, businesses_json, fetched_at)
             VALUES (?, ?, ?)
             ON CONFLICT(location_key) DO UPDATE SET
                 businesses_json = excluded.businesses_json,
                 fetched_at = excluded.fetched_at",
        )
        .bind(entry.location_key.as_str())
        .bind(&businesses_json)
        .bind(entry.fetched_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
