//! Layered error definitions
//!
//! Categorized by source: config / ingress / target / recorder

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum RelayError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Ingress Errors =====
    /// Request body could not be read as a JSON object
    #[error("malformed event: {message}")]
    MalformedEvent { message: String },

    // ===== Target Errors =====
    /// Delivery to a downstream target failed
    #[error("target '{target}' delivery error: {message}")]
    TargetDelivery { target: String, message: String },

    /// Target could not be set up
    #[error("target '{target}' connection error: {message}")]
    TargetConnection { target: String, message: String },

    // ===== Recorder Errors =====
    /// Event recorder failed
    #[error("recorder '{recorder}' error: {message}")]
    Recorder { recorder: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed event error
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }

    /// Create target delivery error
    pub fn target_delivery(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TargetDelivery {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create target connection error
    pub fn target_connection(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TargetConnection {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create recorder error
    pub fn recorder(recorder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Recorder {
            recorder: recorder.into(),
            message: message.into(),
        }
    }
}
