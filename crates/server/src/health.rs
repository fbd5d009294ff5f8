use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{Duration, Utc};
use happytaps_db::{CacheInventory, DbPool, SqlLocationCacheRepository};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    cache: Arc<SqlLocationCacheRepository>,
    freshness_window: Duration,
}

impl HealthState {
    pub fn new(db_pool: DbPool, freshness_window: Duration) -> Self {
        Self { cache: Arc::new(SqlLocationCacheRepository::new(db_pool)), freshness_window }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStoreHealth {
    pub status: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: Readiness,
    pub service: &'static str,
    pub cache_store: CacheStoreHealth,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// `degraded` when the cache store is unreachable; finds then run as live searches.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let now = Utc::now();
    let cache_store = match state.cache.inventory(now, state.freshness_window).await {
        Ok(CacheInventory { entries, fresh }) => CacheStoreHealth {
            status: Readiness::Ready,
            entries: Some(entries),
            fresh: Some(fresh),
            error: None,
        },
        Err(error) => {
            tracing::warn!(
                event_name = "system.health.cache_store_degraded",
                correlation_id = "health",
                error = %error,
                "cache store inventory failed"
            );
            CacheStoreHealth {
                status: Readiness::Degraded,
                entries: None,
                fresh: None,
                error: Some(error.to_string()),
            }
        }
    };

    let status = cache_store.status;
    let payload = HealthResponse {
        status,
        service: "happytaps-server",
        cache_store,
        checked_at: now.to_rfc3339(),
    };

    let status_code = match status {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use happytaps_core::{Business, LocationKey};
    use happytaps_db::{
        connect_with_settings, migrations, LocationCacheRepository, SqlLocationCacheRepository,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::health::{router, HealthState};

    async fn get_health(state: HealthState) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    #[tokio::test]
    async fn health_reports_cache_inventory_when_store_is_reachable() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations apply");
        SqlLocationCacheRepository::new(pool.clone())
            .put(
                &LocationKey("austin".into()),
                vec![Business::new("Lustre Pearl", "https://yelp.test/lp", "https://img.test/lp")],
            )
            .await
            .expect("seed cache");

        let (status, body) = get_health(HealthState::new(pool.clone(), Duration::hours(24))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["service"], "happytaps-server");
        assert_eq!(body["cache_store"]["entries"], 1);
        assert_eq!(body["cache_store"]["fresh"], 1);
        assert!(body["cache_store"].get("error").is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn health_is_degraded_when_cache_store_is_unavailable() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, body) = get_health(HealthState::new(pool, Duration::hours(24))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["cache_store"]["status"], "degraded");
        assert!(body["cache_store"]["error"].is_string());
    }
}
