use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use happytaps_core::selection::choose_business;
use happytaps_core::{
    ApplicationError, Business, CacheEntry, DeliveryError, DeliveryStatus, DirectoryError,
    FindRequest, LocationKey, ResolvedLocation, ResponseDispatcher,
};
use happytaps_db::LocationCacheRepository;
use happytaps_directory::BusinessDirectory;

use crate::flight::{FetchResult, Flight, FlightRegistry};
use crate::outcome::{FindOutcome, SnapshotSource};
use crate::settings::FinderSettings;

/// What `find` did with its callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Delivered(DeliveryStatus),
    /// The request was cancelled before delivery; nothing was sent.
    Skipped,
}

enum CacheLookup {
    Fresh(CacheEntry),
    Stale(CacheEntry),
    Miss,
    Unavailable(ApplicationError),
}

pub struct TapFinder {
    cache: Arc<dyn LocationCacheRepository>,
    directory: Arc<dyn BusinessDirectory>,
    settings: FinderSettings,
    flights: FlightRegistry,
    rng: Mutex<StdRng>,
}

impl TapFinder {
    pub fn new(
        cache: Arc<dyn LocationCacheRepository>,
        directory: Arc<dyn BusinessDirectory>,
        settings: FinderSettings,
    ) -> Self {
        Self::with_rng(cache, directory, settings, StdRng::from_entropy())
    }

    pub fn with_rng(
        cache: Arc<dyn LocationCacheRepository>,
        directory: Arc<dyn BusinessDirectory>,
        settings: FinderSettings,
        rng: StdRng,
    ) -> Self {
        let flights = FlightRegistry::default();
        Self { cache, directory, settings, flights, rng: Mutex::new(rng) }
    }

    pub fn settings(&self) -> &FinderSettings {
        &self.settings
    }

    /// Resolves the request and delivers exactly one payload through `callback`, unless the
    /// request is cancelled first. A refresh started on its behalf still completes and
    /// populates the cache.
    pub async fn find(
        &self,
        request: FindRequest,
        callback: &dyn ResponseDispatcher,
    ) -> Result<Delivery, DeliveryError> {
        let span = info_span!("find", correlation_id = %request.correlation_id);
        async move {
            let outcome = tokio::select! {
                outcome = self.resolve(request.location.as_deref()) => outcome,
                () = request.cancellation.cancelled() => {
                    info!(event_name = "finder.delivery.skipped", "request cancelled mid-lookup");
                    return Ok(Delivery::Skipped);
                }
            };

            if request.is_cancelled() {
                info!(event_name = "finder.delivery.skipped", "request cancelled before send");
                return Ok(Delivery::Skipped);
            }

            let payload = outcome.into_payload();
            let status = payload.status;
            match callback.deliver(&payload).await {
                Ok(()) => {
                    info!(
                        event_name = "finder.delivery.sent",
                        location_key = %payload.location,
                        status = ?status,
                        "find response delivered"
                    );
                    Ok(Delivery::Delivered(status))
                }
                Err(error) => {
                    warn!(
                        event_name = "finder.delivery.failed",
                        location_key = %payload.location,
                        error = %error,
                        "find response could not be delivered"
                    );
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Picks one business for `raw_location` without delivering anything.
    pub async fn resolve(&self, raw_location: Option<&str>) -> FindOutcome {
        let location = ResolvedLocation::resolve(
            raw_location,
            &self.settings.default_location,
            self.settings.case_sensitive_keys,
        );

        let (businesses, source) = match self.lookup(&location.key).await {
            CacheLookup::Fresh(entry) => {
                debug!(
                    event_name = "finder.cache.hit",
                    location_key = %location.key,
                    count = entry.businesses.len(),
                    "serving cached snapshot"
                );
                (Arc::new(entry.businesses), SnapshotSource::Cache)
            }
            lookup => {
                match lookup {
                    CacheLookup::Stale(entry) => debug!(
                        event_name = "finder.cache.stale",
                        location_key = %location.key,
                        age_secs = entry.age(Utc::now()).num_seconds(),
                        "cached snapshot expired"
                    ),
                    CacheLookup::Unavailable(error) => warn!(
                        event_name = "finder.cache.degraded",
                        location_key = %location.key,
                        error = %error,
                        "cache store unavailable; falling back to live search"
                    ),
                    _ => debug!(
                        event_name = "finder.cache.miss",
                        location_key = %location.key,
                        "no cached snapshot"
                    ),
                }

                match self.refresh(&location).await {
                    Ok(businesses) => (businesses, SnapshotSource::Directory),
                    Err(DirectoryError::NoResults) => {
                        info!(
                            event_name = "finder.directory.no_results",
                            location_key = %location.key,
                            "directory has no matches for location"
                        );
                        return FindOutcome::NotFound { location };
                    }
                    Err(DirectoryError::Unavailable(reason)) => {
                        warn!(
                            event_name = "finder.directory.unavailable",
                            location_key = %location.key,
                            error = %reason,
                            "directory search failed"
                        );
                        return FindOutcome::Unavailable { location, reason };
                    }
                }
            }
        };

        match self.pick(&businesses) {
            Some(business) => FindOutcome::Found { location, business, source },
            // Only reachable through an empty snapshot written by something other than us.
            None => FindOutcome::NotFound { location },
        }
    }

    async fn lookup(&self, key: &LocationKey) -> CacheLookup {
        match timeout(self.settings.cache_timeout, self.cache.get(key)).await {
            Ok(Ok(Some(entry))) if entry.is_fresh(Utc::now(), self.settings.freshness_window) => {
                CacheLookup::Fresh(entry)
            }
            Ok(Ok(Some(entry))) => CacheLookup::Stale(entry),
            Ok(Ok(None)) => CacheLookup::Miss,
            Ok(Err(error)) => {
                CacheLookup::Unavailable(ApplicationError::StoreUnavailable(error.to_string()))
            }
            Err(_) => CacheLookup::Unavailable(ApplicationError::StoreUnavailable(format!(
                "cache read timed out after {}ms",
                self.settings.cache_timeout.as_millis()
            ))),
        }
    }

    async fn refresh(&self, location: &ResolvedLocation) -> FetchResult {
        let flight = self.flights.join_or_start(&location.key, || {
            fetch_and_store(
                Arc::clone(&self.directory),
                Arc::clone(&self.cache),
                location.clone(),
                self.settings.directory_timeout,
                self.settings.cache_timeout,
            )
        });

        let shared = match flight {
            Flight::Led(shared) => shared,
            Flight::Joined(shared) => {
                debug!(
                    event_name = "finder.refresh.joined",
                    location_key = %location.key,
                    "joining in-flight directory search"
                );
                shared
            }
        };
        shared.await
    }

    fn pick(&self, businesses: &[Business]) -> Option<Business> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        choose_business(businesses, &mut *rng).cloned()
    }
}

async fn fetch_and_store(
    directory: Arc<dyn BusinessDirectory>,
    cache: Arc<dyn LocationCacheRepository>,
    location: ResolvedLocation,
    directory_timeout: Duration,
    cache_timeout: Duration,
) -> FetchResult {
    debug!(
        event_name = "finder.refresh.started",
        location_key = %location.key,
        query = %location.query,
        "searching directory"
    );

    let businesses = match timeout(directory_timeout, directory.search(&location.query)).await {
        Ok(Ok(businesses)) if businesses.is_empty() => return Err(DirectoryError::NoResults),
        Ok(Ok(businesses)) => businesses,
        Ok(Err(error)) => return Err(error),
        Err(_) => {
            return Err(DirectoryError::Unavailable(format!(
                "directory search timed out after {}ms",
                directory_timeout.as_millis()
            )))
        }
    };

    match timeout(cache_timeout, cache.put(&location.key, businesses.clone())).await {
        Ok(Ok(entry)) => info!(
            event_name = "finder.cache.stored",
            location_key = %location.key,
            count = entry.businesses.len(),
            "cached fresh directory snapshot"
        ),
        Ok(Err(error)) => warn!(
            event_name = "finder.cache.write_failed",
            location_key = %location.key,
            error = %error,
            "could not cache directory snapshot; serving live results"
        ),
        Err(_) => warn!(
            event_name = "finder.cache.write_failed",
            location_key = %location.key,
            error = "timeout",
            "cache write timed out; serving live results"
        ),
    }

    Ok(Arc::new(businesses))
}
