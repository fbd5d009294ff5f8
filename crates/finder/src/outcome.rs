use happytaps_core::{Business, DeliveryPayload, ResolvedLocation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Directory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindOutcome {
    Found { location: ResolvedLocation, business: Business, source: SnapshotSource },
    NotFound { location: ResolvedLocation },
    Unavailable { location: ResolvedLocation, reason: String },
}

impl FindOutcome {
    pub fn into_payload(self) -> DeliveryPayload {
        match self {
            Self::Found { location, business, .. } => {
                DeliveryPayload::found(location.key.to_string(), business)
            }
            Self::NotFound { location } => DeliveryPayload::not_found(location.key.to_string()),
            Self::Unavailable { location, .. } => DeliveryPayload::error(location.key.to_string()),
        }
    }
}
