use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::business::Business;
use crate::domain::location::LocationKey;

/// Snapshot of the last successful directory search for a location.
///
/// Entries are replaced wholesale on refresh and never deleted; age only gates whether a
/// snapshot is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub location_key: LocationKey,
    pub businesses: Vec<Business>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Fresh while `now - fetched_at < window`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) < window
    }
}
