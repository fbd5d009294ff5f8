use std::sync::Arc;

use happytaps_core::config::AppConfig;
use happytaps_core::{DeliveryError, DirectoryError};
use happytaps_db::{connect_with_config, migrations, DbPool, SqlLocationCacheRepository};
use happytaps_directory::YelpDirectoryClient;
use happytaps_finder::{FinderSettings, TapFinder};
use happytaps_slack::ResponseUrlDispatcher;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub finder: Arc<TapFinder>,
    pub slack_http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("directory client setup failed: {0}")]
    Directory(#[source] DirectoryError),
    #[error("slack client setup failed: {0}")]
    Slack(#[source] DeliveryError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let directory = YelpDirectoryClient::new(&config.directory).map_err(BootstrapError::Directory)?;
    let cache = SqlLocationCacheRepository::new(db_pool.clone());
    let finder = TapFinder::new(
        Arc::new(cache),
        Arc::new(directory),
        FinderSettings::from_config(&config),
    );
    let slack_http = ResponseUrlDispatcher::client(config.slack.delivery_timeout())
        .map_err(BootstrapError::Slack)?;

    info!(
        event_name = "system.bootstrap.finder_ready",
        correlation_id = "bootstrap",
        default_location = %config.finder.default_location,
        freshness_hours = config.cache.freshness_hours,
        "tap finder initialized"
    );

    Ok(Application { config, db_pool, finder: Arc::new(finder), slack_http })
}

#[cfg(test)]
mod tests {
    use happytaps_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                directory_api_key: Some("test-key".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load with overrides")
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database() {
        let result =
            bootstrap_with_config(config("sqlite:///nonexistent-happytaps-dir/nested/cache.db"))
                .await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_prepares_cache_schema() {
        let app = bootstrap_with_config(config("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'location_cache'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("query sqlite_master");
        assert_eq!(table_count, 1);
        assert_eq!(app.finder.settings().default_location, app.config.finder.default_location);

        app.db_pool.close().await;
    }
}
