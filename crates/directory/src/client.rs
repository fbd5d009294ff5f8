use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use happytaps_core::config::DirectoryConfig;
use happytaps_core::{Business, DirectoryError};

use crate::types::{RawBusiness, SearchResponse};
use crate::BusinessDirectory;

const SEARCH_PATH: &str = "businesses/search";

/// Client for the Yelp Fusion business search endpoint.
///
/// Every request is filtered to the configured category (`term`), capped at `limit`
/// results and restricted to the configured price tiers.
pub struct YelpDirectoryClient {
    client: Client,
    api_key: SecretString,
    search_url: Url,
    term: String,
    limit: u32,
    price: String,
}

impl YelpDirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        Self::with_base_url(config, &config.base_url)
    }

    /// Same as [`YelpDirectoryClient::new`] but pointed at `base_url`, e.g. a mock server.
    pub fn with_base_url(config: &DirectoryConfig, base_url: &str) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(concat!("happytaps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::Unavailable(format!("http client init failed: {e}")))?;

        // Exactly one trailing slash so `join` appends instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .and_then(|base| base.join(SEARCH_PATH))
            .map_err(|e| {
                DirectoryError::Unavailable(format!("invalid base URL '{base_url}': {e}"))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            search_url,
            term: config.term.clone(),
            limit: config.limit,
            price: config.price.clone(),
        })
    }

    fn query<'a>(&'a self, location: &'a str, limit: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("location", location),
            ("term", self.term.as_str()),
            ("limit", limit),
            ("price", self.price.as_str()),
        ]
    }
}

#[async_trait]
impl BusinessDirectory for YelpDirectoryClient {
    async fn search(&self, location: &str) -> Result<Vec<Business>, DirectoryError> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .query(&self.query(location, &limit))
            .send()
            .await
            .map_err(|e| {
                warn!(location, error = %e, "directory request failed");
                DirectoryError::Unavailable(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                location,
                status = status.as_u16(),
                body = %truncate(&body, 256),
                "directory rejected search"
            );
            return Err(unexpected_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("response body read failed: {e}")))?;
        let businesses = parse_search_body(&body, self.limit as usize)?;
        debug!(location, count = businesses.len(), "directory search completed");
        Ok(businesses)
    }
}

/// Decodes a search response; a missing or empty `businesses` array is `NoResults`.
/// Entries past `limit` are dropped even if the upstream ignored the `limit` parameter.
pub(crate) fn parse_search_body(
    body: &[u8],
    limit: usize,
) -> Result<Vec<Business>, DirectoryError> {
    let parsed: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| DirectoryError::Unavailable(format!("malformed search response: {e}")))?;

    let raw = parsed.businesses.unwrap_or_default();
    if raw.is_empty() {
        return Err(DirectoryError::NoResults);
    }

    raw.into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| into_business(index, entry))
        .collect()
}

fn into_business(index: usize, raw: RawBusiness) -> Result<Business, DirectoryError> {
    let missing = |field: &str| {
        DirectoryError::Unavailable(format!("business #{index} is missing `{field}`"))
    };

    Ok(Business {
        name: raw.name.ok_or_else(|| missing("name"))?,
        url: raw.url.ok_or_else(|| missing("url"))?,
        image_url: raw.image_url.ok_or_else(|| missing("image_url"))?,
    })
}

fn unexpected_status(status: StatusCode) -> DirectoryError {
    DirectoryError::Unavailable(format!("unexpected HTTP status {}", status.as_u16()))
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
