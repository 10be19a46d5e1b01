//! WorkOrderEvent - ingress output, dispatcher input
//!
//! An opaque JSON object plus the path identifier it arrived under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RelayError;

/// Message returned to every accepted work request
pub const ACK_MESSAGE: &str = "WO received.";

/// One accepted work-order payload
///
/// Immutable once accepted. The dispatcher reads it through an `Arc`
/// and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderEvent {
    /// Caller-supplied path segment (not validated, not deduplicated)
    pub work_order_id: String,

    /// Receive time at the ingress
    pub received_at: DateTime<Utc>,

    /// The raw JSON object body
    pub body: Map<String, Value>,
}

impl WorkOrderEvent {
    /// Create an event received now
    pub fn new(work_order_id: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            work_order_id: work_order_id.into(),
            received_at: Utc::now(),
            body,
        }
    }

    /// Parse a request body into an event
    ///
    /// An empty (or whitespace-only) body is treated as `{}`.
    ///
    /// # Errors
    /// Returns `RelayError::MalformedEvent` when the body is not valid JSON
    /// or is valid JSON but not an object.
    pub fn from_slice(work_order_id: impl Into<String>, raw: &[u8]) -> Result<Self, RelayError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new(work_order_id, Map::new()));
        }

        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| RelayError::malformed_event(format!("invalid JSON: {e}")))?;

        match value {
            Value::Object(body) => Ok(Self::new(work_order_id, body)),
            other => Err(RelayError::malformed_event(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Body as an owned JSON value
    pub fn body_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Immediate acknowledgment of an accepted event
///
/// Produced before any dispatch work happens; carries no information
/// about downstream delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Work-order id of the accepted event
    pub work_order_id: String,

    /// Delay applied before this event fans out (milliseconds)
    pub delay_ms: u64,
}

impl Acknowledgment {
    /// Message sent back to the caller
    pub fn message(&self) -> &'static str {
        ACK_MESSAGE
    }
}
