use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use happytaps_core::{DeliveryError, DeliveryPayload, ResponseDispatcher};

use crate::blocks::render_payload;

/// Replies to one slash command by posting Block Kit JSON to its `response_url`.
#[derive(Clone)]
pub struct ResponseUrlDispatcher {
    client: Client,
    response_url: String,
}

impl ResponseUrlDispatcher {
    /// `client` is shared across commands; build it once with [`ResponseUrlDispatcher::client`].
    pub fn new(client: Client, response_url: impl Into<String>) -> Self {
        Self { client, response_url: response_url.into() }
    }

    pub fn client(timeout: Duration) -> Result<Client, DeliveryError> {
        Client::builder()
            .timeout(timeout)
            .user_agent(concat!("happytaps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Transport(format!("http client init failed: {e}")))
    }
}

#[async_trait]
impl ResponseDispatcher for ResponseUrlDispatcher {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<(), DeliveryError> {
        let message = render_payload(payload);
        let body = serde_json::to_vec(&message).map_err(|e| DeliveryError::Render(e.to_string()))?;

        let response = self
            .client
            .post(&self.response_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(event_name = "slack.response_url.transport_error", error = %e);
                DeliveryError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "slack.response_url.rejected",
                status = status.as_u16(),
                "slack rejected delayed response"
            );
            return Err(DeliveryError::Rejected { status: status.as_u16() });
        }

        debug!(event_name = "slack.response_url.sent", status = status.as_u16());
        Ok(())
    }
}
