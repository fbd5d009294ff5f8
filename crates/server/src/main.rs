mod bootstrap;
mod commands;
mod health;

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use happytaps_core::config::{AppConfig, LoadOptions};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::Application;
use crate::commands::CommandState;
use crate::health::HealthState;

fn init_logging(config: &AppConfig) {
    use happytaps_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let tasks = TaskTracker::new();
    let shutdown = CancellationToken::new();
    let router = app_router(&app, tasks.clone(), shutdown.clone());

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        command = %app.config.slack.command,
        "happytaps-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        in_flight = tasks.len(),
        "draining in-flight finds"
    );
    drain(&tasks, &shutdown, Duration::from_secs(app.config.server.graceful_shutdown_secs)).await;
    app.db_pool.close().await;

    Ok(())
}

fn app_router(app: &Application, tasks: TaskTracker, shutdown: CancellationToken) -> Router {
    let state = CommandState {
        finder: app.finder.clone(),
        slack_http: app.slack_http.clone(),
        command: app.config.slack.command.clone(),
        ack_text: app.config.slack.ack_text.clone(),
        tasks,
        shutdown,
    };
    let health = HealthState::new(app.db_pool.clone(), app.config.cache.freshness_window());
    commands::router(state).merge(health::router(health))
}

/// Waits up to `grace` for spawned finds, then cancels whatever is left so it skips delivery.
async fn drain(tasks: &TaskTracker, shutdown: &CancellationToken, grace: Duration) {
    tasks.close();
    if tokio::time::timeout(grace, tasks.wait()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            remaining = tasks.len(),
            "grace period elapsed; cancelling remaining finds"
        );
        shutdown.cancel();
        tasks.wait().await;
    }
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for ctrl-c"
        );
        std::future::pending::<()>().await;
    }
}
