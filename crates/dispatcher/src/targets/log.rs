//! LogTarget - logs the shaped payload via tracing

use contracts::{DeliveryTarget, RelayError};
use serde_json::Value;
use tracing::{info, instrument};

/// Target that only logs what it would have delivered
pub struct LogTarget {
    name: String,
}

impl LogTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DeliveryTarget for LogTarget {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_target_deliver", skip(self, payload), fields(target_name = %self.name))]
    async fn deliver(&self, payload: &Value) -> Result<(), RelayError> {
        info!(target_name = %self.name, payload = %payload, "Payload delivered to log");
        Ok(())
    }
}
