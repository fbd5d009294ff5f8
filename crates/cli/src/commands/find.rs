use std::sync::Arc;

use serde::Serialize;

use happytaps_core::DeliveryPayload;
use happytaps_db::{connect_with_config, migrations, SqlLocationCacheRepository};
use happytaps_directory::YelpDirectoryClient;
use happytaps_finder::{FindOutcome, FinderSettings, SnapshotSource, TapFinder};

use crate::commands::{current_thread_runtime, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct FindReport {
    command: &'static str,
    status: &'static str,
    source: Option<&'static str>,
    reason: Option<String>,
    payload: DeliveryPayload,
}

/// Resolves `location` the same way a slash command would and prints the payload instead of
/// posting it. Exit code 6 means the directory could not be reached.
pub fn run(location: Option<&str>) -> CommandResult {
    let config = match load_config("find") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime("find") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let directory = YelpDirectoryClient::new(&config.directory)
            .map_err(|error| ("directory_init", error.to_string(), 6u8))?;

        let finder = TapFinder::new(
            Arc::new(SqlLocationCacheRepository::new(pool.clone())),
            Arc::new(directory),
            FinderSettings::from_config(&config),
        );
        let outcome = finder.resolve(location).await;
        pool.close().await;
        Ok::<FindOutcome, (&'static str, String, u8)>(outcome)
    });

    match result {
        Ok(outcome) => report(outcome),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("find", error_class, message, exit_code)
        }
    }
}

fn report(outcome: FindOutcome) -> CommandResult {
    let (status, source, reason, exit_code) = match &outcome {
        FindOutcome::Found { source, .. } => {
            let source = match source {
                SnapshotSource::Cache => "cache",
                SnapshotSource::Directory => "directory",
            };
            ("ok", Some(source), None, 0)
        }
        FindOutcome::NotFound { .. } => ("not_found", None, None, 0),
        FindOutcome::Unavailable { reason, .. } => ("error", None, Some(reason.clone()), 6),
    };

    let report =
        FindReport { command: "find", status, source, reason, payload: outcome.into_payload() };
    match serde_json::to_string(&report) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure("find", "serialization", error.to_string(), 1),
    }
}
