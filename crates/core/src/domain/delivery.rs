use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::business::Business;
use crate::errors::DeliveryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Found,
    NotFound,
    Error,
}

/// The single response produced for every inbound find request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub location: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<Business>,
}

impl DeliveryPayload {
    pub fn found(location: impl Into<String>, business: Business) -> Self {
        Self { location: location.into(), status: DeliveryStatus::Found, business: Some(business) }
    }

    pub fn not_found(location: impl Into<String>) -> Self {
        Self { location: location.into(), status: DeliveryStatus::NotFound, business: None }
    }

    pub fn error(location: impl Into<String>) -> Self {
        Self { location: location.into(), status: DeliveryStatus::Error, business: None }
    }
}

/// Delivers a payload back to whoever issued the command.
#[async_trait]
pub trait ResponseDispatcher: Send + Sync {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<(), DeliveryError>;
}
