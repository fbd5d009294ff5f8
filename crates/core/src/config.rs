use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ten years; keeps the window representable as a `chrono::Duration`.
const MAX_FRESHNESS_HOURS: u64 = 24 * 365 * 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub directory: DirectoryConfig,
    pub cache: CacheConfig,
    pub finder: FinderConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub term: String,
    pub limit: u32,
    pub price: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub freshness_hours: u64,
    pub timeout_secs: u64,
    pub case_sensitive_keys: bool,
}

#[derive(Clone, Debug)]
pub struct FinderConfig {
    pub default_location: String,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub command: String,
    pub delivery_timeout_secs: u64,
    pub ack_text: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub directory_api_key: Option<String>,
    pub directory_base_url: Option<String>,
    pub cache_freshness_hours: Option<u64>,
    pub default_location: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://happytaps.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            directory: DirectoryConfig {
                api_key: String::new().into(),
                base_url: "https://api.yelp.com/v3".to_string(),
                term: "bar".to_string(),
                limit: 20,
                price: "1,2,3".to_string(),
                timeout_secs: 5,
            },
            cache: CacheConfig { freshness_hours: 24, timeout_secs: 3, case_sensitive_keys: false },
            finder: FinderConfig { default_location: "NYC".to_string() },
            slack: SlackConfig {
                command: "/happytaps".to_string(),
                delivery_timeout_secs: 5,
                ack_text: "One watering hole coming up!".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CacheConfig {
    pub fn freshness_window(&self) -> chrono::Duration {
        let hours = self.freshness_hours.min(MAX_FRESHNESS_HOURS);
        chrono::Duration::hours(hours as i64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SlackConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("happytaps.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(directory) = patch.directory {
            if let Some(api_key_value) = directory.api_key {
                self.directory.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = directory.base_url {
                self.directory.base_url = base_url;
            }
            if let Some(term) = directory.term {
                self.directory.term = term;
            }
            if let Some(limit) = directory.limit {
                self.directory.limit = limit;
            }
            if let Some(price) = directory.price {
                self.directory.price = price;
            }
            if let Some(timeout_secs) = directory.timeout_secs {
                self.directory.timeout_secs = timeout_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(freshness_hours) = cache.freshness_hours {
                self.cache.freshness_hours = freshness_hours;
            }
            if let Some(timeout_secs) = cache.timeout_secs {
                self.cache.timeout_secs = timeout_secs;
            }
            if let Some(case_sensitive_keys) = cache.case_sensitive_keys {
                self.cache.case_sensitive_keys = case_sensitive_keys;
            }
        }

        if let Some(finder) = patch.finder {
            if let Some(default_location) = finder.default_location {
                self.finder.default_location = default_location;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(command) = slack.command {
                self.slack.command = command;
            }
            if let Some(delivery_timeout_secs) = slack.delivery_timeout_secs {
                self.slack.delivery_timeout_secs = delivery_timeout_secs;
            }
            if let Some(ack_text) = slack.ack_text {
                self.slack.ack_text = ack_text;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HAPPYTAPS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("HAPPYTAPS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HAPPYTAPS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let api_key = read_env("HAPPYTAPS_DIRECTORY_API_KEY").or_else(|| read_env("YELP_API_KEY"));
        if let Some(value) = api_key {
            self.directory.api_key = secret_value(value);
        }
        if let Some(value) = read_env("HAPPYTAPS_DIRECTORY_BASE_URL") {
            self.directory.base_url = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_DIRECTORY_TERM") {
            self.directory.term = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_DIRECTORY_LIMIT") {
            self.directory.limit = parse_u32("HAPPYTAPS_DIRECTORY_LIMIT", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_DIRECTORY_PRICE") {
            self.directory.price = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_DIRECTORY_TIMEOUT_SECS") {
            self.directory.timeout_secs = parse_u64("HAPPYTAPS_DIRECTORY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HAPPYTAPS_CACHE_FRESHNESS_HOURS") {
            self.cache.freshness_hours = parse_u64("HAPPYTAPS_CACHE_FRESHNESS_HOURS", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_CACHE_TIMEOUT_SECS") {
            self.cache.timeout_secs = parse_u64("HAPPYTAPS_CACHE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_CACHE_CASE_SENSITIVE_KEYS") {
            self.cache.case_sensitive_keys =
                parse_bool("HAPPYTAPS_CACHE_CASE_SENSITIVE_KEYS", &value)?;
        }

        if let Some(value) = read_env("HAPPYTAPS_FINDER_DEFAULT_LOCATION") {
            self.finder.default_location = value;
        }

        if let Some(value) = read_env("HAPPYTAPS_SLACK_COMMAND") {
            self.slack.command = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_SLACK_DELIVERY_TIMEOUT_SECS") {
            self.slack.delivery_timeout_secs =
                parse_u64("HAPPYTAPS_SLACK_DELIVERY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_SLACK_ACK_TEXT") {
            self.slack.ack_text = value;
        }

        if let Some(value) = read_env("HAPPYTAPS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HAPPYTAPS_SERVER_PORT") {
            self.server.port = parse_u16("HAPPYTAPS_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HAPPYTAPS_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HAPPYTAPS_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("HAPPYTAPS_LOGGING_LEVEL").or_else(|| read_env("HAPPYTAPS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HAPPYTAPS_LOGGING_FORMAT").or_else(|| read_env("HAPPYTAPS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(api_key) = overrides.directory_api_key {
            self.directory.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.directory_base_url {
            self.directory.base_url = base_url;
        }
        if let Some(freshness_hours) = overrides.cache_freshness_hours {
            self.cache.freshness_hours = freshness_hours;
        }
        if let Some(default_location) = overrides.default_location {
            self.finder.default_location = default_location;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_directory(&self.directory)?;
        validate_cache(&self.cache)?;
        validate_finder(&self.finder)?;
        validate_slack(&self.slack)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("happytaps.toml"), PathBuf::from("config/happytaps.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_directory(directory: &DirectoryConfig) -> Result<(), ConfigError> {
    if directory.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "directory.api_key is required. Create one at https://www.yelp.com/developers/v3/manage_app and set HAPPYTAPS_DIRECTORY_API_KEY or YELP_API_KEY".to_string(),
        ));
    }

    let base_url = directory.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "directory.base_url must start with http:// or https://".to_string(),
        ));
    }

    if directory.term.trim().is_empty() {
        return Err(ConfigError::Validation("directory.term must not be empty".to_string()));
    }

    if directory.limit == 0 || directory.limit > 50 {
        return Err(ConfigError::Validation("directory.limit must be in range 1..=50".to_string()));
    }

    if directory.timeout_secs == 0 || directory.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "directory.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.freshness_hours == 0 || cache.freshness_hours > MAX_FRESHNESS_HOURS {
        return Err(ConfigError::Validation(format!(
            "cache.freshness_hours must be in range 1..={MAX_FRESHNESS_HOURS}"
        )));
    }

    if cache.timeout_secs == 0 || cache.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "cache.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_finder(finder: &FinderConfig) -> Result<(), ConfigError> {
    if finder.default_location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "finder.default_location must not be blank".to_string(),
        ));
    }

    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if !slack.command.starts_with('/') || slack.command.len() < 2 {
        return Err(ConfigError::Validation(format!(
            "slack.command must be a slash command such as `/happytaps` (got `{}`)",
            slack.command
        )));
    }

    if slack.delivery_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "slack.delivery_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    directory: Option<DirectoryPatch>,
    cache: Option<CachePatch>,
    finder: Option<FinderPatch>,
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    term: Option<String>,
    limit: Option<u32>,
    price: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    freshness_hours: Option<u64>,
    timeout_secs: Option<u64>,
    case_sensitive_keys: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FinderPatch {
    default_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    command: Option<String>,
    delivery_timeout_secs: Option<u64>,
    ack_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "HAPPYTAPS_DIRECTORY_API_KEY",
        "YELP_API_KEY",
        "HAPPYTAPS_DATABASE_URL",
        "HAPPYTAPS_CACHE_FRESHNESS_HOURS",
        "HAPPYTAPS_LOG_LEVEL",
        "HAPPYTAPS_LOG_FORMAT",
        "HAPPYTAPS_SERVER_PORT",
        "TEST_YELP_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in MANAGED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_YELP_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("happytaps.toml");
            fs::write(
                &path,
                r#"
[directory]
api_key = "${TEST_YELP_KEY}"

[cache]
freshness_hours = 336
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.directory.api_key.expose_secret() == "key-from-env",
                "api key should be interpolated from the environment",
            )?;
            ensure(config.cache.freshness_hours == 336, "two-week window should load from file")?;
            ensure(
                config.cache.freshness_window() == chrono::Duration::weeks(2),
                "freshness window should convert hours to a duration",
            )?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn defaults_match_the_original_service() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("YELP_API_KEY", "legacy-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.directory.api_key.expose_secret() == "legacy-key",
                "legacy YELP_API_KEY should be accepted",
            )?;
            ensure(config.finder.default_location == "NYC", "default location should be NYC")?;
            ensure(config.directory.term == "bar", "default term should be bar")?;
            ensure(config.directory.limit == 20, "default limit should be 20")?;
            ensure(config.directory.price == "1,2,3", "default price tiers should be 1,2,3")?;
            ensure(config.cache.freshness_hours == 24, "default freshness should be a day")?;
            ensure(!config.cache.case_sensitive_keys, "keys should be case-insensitive")?;
            ensure(config.server.port == 3000, "default port should be 3000")?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HAPPYTAPS_DIRECTORY_API_KEY", "key-test");
        env::set_var("HAPPYTAPS_LOG_LEVEL", "warn");
        env::set_var("HAPPYTAPS_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HAPPYTAPS_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("HAPPYTAPS_DIRECTORY_API_KEY", "key-from-env");
        env::set_var("HAPPYTAPS_CACHE_FRESHNESS_HOURS", "48");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("happytaps.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[directory]
api_key = "key-from-file"

[cache]
freshness_hours = 12

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.directory.api_key.expose_secret() == "key-from-env",
                "env api key should win over file and defaults",
            )?;
            ensure(config.cache.freshness_hours == 48, "env freshness should win over file")?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn validation_fails_fast_without_directory_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("directory.api_key")
        );
        ensure(has_message, "validation failure should mention directory.api_key")
    }

    #[test]
    fn invalid_numeric_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HAPPYTAPS_DIRECTORY_API_KEY", "key-test");
        env::set_var("HAPPYTAPS_SERVER_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "HAPPYTAPS_SERVER_PORT", "error should name the offending key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HAPPYTAPS_DIRECTORY_API_KEY", "super-secret-yelp-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-yelp-key"),
                "debug output should not contain the directory api key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn freshness_window_is_bounded() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HAPPYTAPS_DIRECTORY_API_KEY", "key-test");
        env::set_var("HAPPYTAPS_CACHE_FRESHNESS_HOURS", "99999999");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected out-of-range freshness to be rejected".to_string()),
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("cache.freshness_hours"), "error should name the field")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars();
        result
    }
}
