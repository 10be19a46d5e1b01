//! LogRecorder - records events via tracing

use contracts::{EventRecorder, RelayError, WorkOrderEvent};
use tracing::{info, instrument};

/// Recorder that logs each accepted event
pub struct LogRecorder {
    name: String,
}

impl LogRecorder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EventRecorder for LogRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_recorder_record",
        skip(self, event),
        fields(recorder = %self.name, work_order_id = %event.work_order_id)
    )]
    async fn record(&mut self, event: &WorkOrderEvent) -> Result<(), RelayError> {
        info!(
            recorder = %self.name,
            work_order_id = %event.work_order_id,
            received_at = %event.received_at,
            fields = event.body.len(),
            body = %event.body_value(),
            "Work order recorded"
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), RelayError> {
        Ok(())
    }
}
