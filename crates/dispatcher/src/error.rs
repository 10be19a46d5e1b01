//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Target creation error
    #[error("failed to create target '{name}': {message}")]
    TargetCreation { name: String, message: String },

    /// Contract error
    #[error("relay error: {0}")]
    Contract(#[from] contracts::RelayError),
}

impl DispatcherError {
    /// Create a target creation error
    pub fn target_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TargetCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
