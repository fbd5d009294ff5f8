use tokio_util::sync::CancellationToken;

/// One inbound find, as handed over by the command dispatcher.
#[derive(Clone, Debug)]
pub struct FindRequest {
    pub location: Option<String>,
    pub correlation_id: String,
    pub cancellation: CancellationToken,
}

impl FindRequest {
    pub fn new(location: Option<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            location,
            correlation_id: correlation_id.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
