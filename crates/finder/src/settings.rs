use std::time::Duration;

use happytaps_core::config::AppConfig;

#[derive(Clone, Debug)]
pub struct FinderSettings {
    pub default_location: String,
    pub freshness_window: chrono::Duration,
    pub case_sensitive_keys: bool,
    pub cache_timeout: Duration,
    pub directory_timeout: Duration,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl FinderSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_location: config.finder.default_location.clone(),
            freshness_window: config.cache.freshness_window(),
            case_sensitive_keys: config.cache.case_sensitive_keys,
            cache_timeout: config.cache.timeout(),
            directory_timeout: config.directory.timeout(),
        }
    }
}
