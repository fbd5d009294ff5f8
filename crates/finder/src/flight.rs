use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;
use tracing::Instrument;

use happytaps_core::{Business, DirectoryError, LocationKey};

pub(crate) type FetchResult = Result<Arc<Vec<Business>>, DirectoryError>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

pub(crate) enum Flight {
    Led(SharedFetch),
    Joined(SharedFetch),
}

/// Per-key in-flight markers. At most one refresh runs per location key; later callers
/// await the same shared result.
#[derive(Clone, Default)]
pub(crate) struct FlightRegistry {
    in_flight: Arc<Mutex<HashMap<LocationKey, SharedFetch>>>,
}

impl FlightRegistry {
    /// Joins the outstanding refresh for `key`, or spawns `fetch` as the new one.
    ///
    /// The spawned task runs to completion even if every waiter goes away, and clears the
    /// marker before publishing its result.
    pub(crate) fn join_or_start<F, Fut>(&self, key: &LocationKey, fetch: F) -> Flight
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let mut in_flight = self.lock();
        if let Some(existing) = in_flight.get(key) {
            return Flight::Joined(existing.clone());
        }

        let (tx, rx) = oneshot::channel();
        let shared = async move {
            rx.await.unwrap_or_else(|_| {
                Err(DirectoryError::Unavailable("refresh task ended without a result".to_owned()))
            })
        }
        .boxed()
        .shared();
        in_flight.insert(key.clone(), shared.clone());
        drop(in_flight);

        let guard = FlightGuard { registry: self.clone(), key: key.clone() };
        let fetch = fetch();
        tokio::spawn(
            async move {
                let result = fetch.await;
                drop(guard);
                let _ = tx.send(result);
            }
            .in_current_span(),
        );

        Flight::Led(shared)
    }

    #[cfg(test)]
    pub(crate) fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LocationKey, SharedFetch>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the marker for `key` when the refresh finishes or unwinds.
struct FlightGuard {
    registry: FlightRegistry,
    key: LocationKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
