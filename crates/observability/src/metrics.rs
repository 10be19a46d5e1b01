//! Relay metric helpers
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! they are no-ops, so library code calls them unconditionally.

use metrics::{counter, gauge, histogram};

/// Record one access-gate evaluation
pub fn record_gate_decision(decision: &'static str) {
    counter!("wo_relay_gate_decisions_total", "decision" => decision).increment(1);
}

/// Record an accepted event and the delay it was scheduled with
pub fn record_event_accepted(delay_ms: u64) {
    counter!("wo_relay_events_accepted_total").increment(1);
    gauge!("wo_relay_dispatch_delay_ms").set(delay_ms as f64);
    histogram!("wo_relay_dispatch_delay_ms_hist").record(delay_ms as f64);
}

/// Record a request body rejected before acknowledgment
pub fn record_malformed_event() {
    counter!("wo_relay_events_malformed_total").increment(1);
}

/// Record one delivery attempt outcome
pub fn record_delivery(target: &str, success: bool, elapsed_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "wo_relay_deliveries_total",
        "target" => target.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "wo_relay_delivery_duration_ms",
        "target" => target.to_string()
    )
    .record(elapsed_ms);
}

/// Record one recorder outcome
pub fn record_event_recorded(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("wo_relay_events_recorded_total", "status" => status).increment(1);
}

/// Current number of scheduled, not yet fired, dispatches
pub fn set_pending_dispatches(pending: usize) {
    gauge!("wo_relay_pending_dispatches").set(pending as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_without_recorder() {
        record_gate_decision("allow");
        record_event_accepted(1000);
        record_malformed_event();
        record_delivery("netsuite", false, 12.5);
        record_event_recorded(true);
        set_pending_dispatches(3);
    }
}
