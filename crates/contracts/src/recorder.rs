//! EventRecorder trait - best-effort side channel for raw events

use crate::{RelayError, WorkOrderEvent};

/// Raw event recorder
///
/// Failures are reported to the caller, which logs and discards them.
#[trait_variant::make(EventRecorder: Send)]
pub trait LocalEventRecorder {
    /// Recorder name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Record one accepted event
    async fn record(&mut self, event: &WorkOrderEvent) -> Result<(), RelayError>;

    /// Flush buffered records (if any)
    async fn flush(&mut self) -> Result<(), RelayError>;
}
