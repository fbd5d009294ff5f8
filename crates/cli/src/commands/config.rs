use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use happytaps_core::config::AppConfig;
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn field(key_path: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    Field { key_path, value, env_keys }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        field("database.url", config.database.url.clone(), &["HAPPYTAPS_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["HAPPYTAPS_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["HAPPYTAPS_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "directory.api_key",
            redact_secret(config.directory.api_key.expose_secret()),
            &["HAPPYTAPS_DIRECTORY_API_KEY", "YELP_API_KEY"],
        ),
        field(
            "directory.base_url",
            config.directory.base_url.clone(),
            &["HAPPYTAPS_DIRECTORY_BASE_URL"],
        ),
        field("directory.term", config.directory.term.clone(), &["HAPPYTAPS_DIRECTORY_TERM"]),
        field(
            "directory.limit",
            config.directory.limit.to_string(),
            &["HAPPYTAPS_DIRECTORY_LIMIT"],
        ),
        field("directory.price", config.directory.price.clone(), &["HAPPYTAPS_DIRECTORY_PRICE"]),
        field(
            "directory.timeout_secs",
            config.directory.timeout_secs.to_string(),
            &["HAPPYTAPS_DIRECTORY_TIMEOUT_SECS"],
        ),
        field(
            "cache.freshness_hours",
            config.cache.freshness_hours.to_string(),
            &["HAPPYTAPS_CACHE_FRESHNESS_HOURS"],
        ),
        field(
            "cache.timeout_secs",
            config.cache.timeout_secs.to_string(),
            &["HAPPYTAPS_CACHE_TIMEOUT_SECS"],
        ),
        field(
            "cache.case_sensitive_keys",
            config.cache.case_sensitive_keys.to_string(),
            &["HAPPYTAPS_CACHE_CASE_SENSITIVE_KEYS"],
        ),
        field(
            "finder.default_location",
            config.finder.default_location.clone(),
            &["HAPPYTAPS_FINDER_DEFAULT_LOCATION"],
        ),
        field("slack.command", config.slack.command.clone(), &["HAPPYTAPS_SLACK_COMMAND"]),
        field(
            "slack.delivery_timeout_secs",
            config.slack.delivery_timeout_secs.to_string(),
            &["HAPPYTAPS_SLACK_DELIVERY_TIMEOUT_SECS"],
        ),
        field("slack.ack_text", config.slack.ack_text.clone(), &["HAPPYTAPS_SLACK_ACK_TEXT"]),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["HAPPYTAPS_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["HAPPYTAPS_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["HAPPYTAPS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["HAPPYTAPS_LOGGING_LEVEL", "HAPPYTAPS_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["HAPPYTAPS_LOGGING_FORMAT", "HAPPYTAPS_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("happytaps.toml"), PathBuf::from("config/happytaps.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters so operators can tell keys apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }

    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("***{suffix}")
}
