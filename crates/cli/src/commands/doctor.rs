use chrono::Utc;
use happytaps_core::config::{AppConfig, LoadOptions};
use happytaps_db::{connect_with_config, DbPool, SqlLocationCacheRepository};
use happytaps_directory::YelpDirectoryClient;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::CommandResult;

const CHECKS_AFTER_CONFIG: [&str; 3] =
    ["directory_readiness", "database_connectivity", "cache_inventory"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// Skipped checks do not fail the report; any failed check does.
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let failed = checks.iter().filter(|check| check.status == CheckStatus::Fail).count();
        let (overall_status, summary) = if failed == 0 {
            (CheckStatus::Pass, "doctor: happytaps is ready to serve finds".to_string())
        } else {
            (CheckStatus::Fail, format!("doctor: {failed} readiness check(s) failed"))
        };
        Self { overall_status, summary, checks }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = DoctorReport::from_checks(collect_checks());
    let exit_code = u8::from(report.overall_status != CheckStatus::Pass);

    let output = if json_output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => json,
            Err(error) => {
                return CommandResult::failure("doctor", "serialization", error.to_string(), 1)
            }
        }
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn collect_checks() -> Vec<DoctorCheck> {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let mut checks = vec![DoctorCheck::fail("config_validation", error.to_string())];
            checks.extend(CHECKS_AFTER_CONFIG.into_iter().map(|name| {
                DoctorCheck::skipped(name, "configuration did not load")
            }));
            return checks;
        }
    };

    let mut checks = vec![
        DoctorCheck::pass("config_validation", "configuration loaded and validated"),
        check_directory_readiness(&config),
    ];
    checks.extend(check_cache_store(&config));
    checks
}

/// Builds the directory client without issuing a search.
fn check_directory_readiness(config: &AppConfig) -> DoctorCheck {
    let key_length = config.directory.api_key.expose_secret().trim().len();
    match YelpDirectoryClient::new(&config.directory) {
        Ok(_) => DoctorCheck::pass(
            "directory_readiness",
            format!(
                "client ready for `{}` ({key_length}-character api key)",
                config.directory.base_url
            ),
        ),
        Err(error) => DoctorCheck::fail("directory_readiness", error.to_string()),
    }
}

/// Connects to the cache database, then reports how many snapshots are still fresh.
fn check_cache_store(config: &AppConfig) -> [DoctorCheck; 2] {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return [
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("cache_inventory", "no async runtime"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return [
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to `{}`: {error}", config.database.url),
                    ),
                    DoctorCheck::skipped("cache_inventory", "database unreachable"),
                ];
            }
        };

        let inventory = check_cache_inventory(&pool, config).await;
        pool.close().await;
        [
            DoctorCheck::pass(
                "database_connectivity",
                format!("connected using `{}`", config.database.url),
            ),
            inventory,
        ]
    })
}

async fn check_cache_inventory(pool: &DbPool, config: &AppConfig) -> DoctorCheck {
    let table_present: Result<(i64,), sqlx::Error> = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'location_cache'",
    )
    .fetch_one(pool)
    .await;

    match table_present {
        Ok((0,)) => {
            return DoctorCheck::skipped(
                "cache_inventory",
                "location_cache table missing; run `happytaps migrate`",
            )
        }
        Ok(_) => {}
        Err(error) => return DoctorCheck::fail("cache_inventory", error.to_string()),
    }

    let repository = SqlLocationCacheRepository::new(pool.clone());
    match repository.inventory(Utc::now(), config.cache.freshness_window()).await {
        Ok(inventory) => DoctorCheck::pass(
            "cache_inventory",
            format!(
                "{} cached location(s), {} fresh within {}h",
                inventory.entries, inventory.fresh, config.cache.freshness_hours
            ),
        ),
        Err(error) => DoctorCheck::fail("cache_inventory", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    lines.extend(report.checks.iter().map(|check| {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        format!("- [{marker}] {}: {}", check.name, check.details)
    }));
    lines.join("\n")
}
