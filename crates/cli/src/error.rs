//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Listen address could not be parsed
    #[error("Invalid listen address '{addr}': {message}")]
    InvalidAddress { addr: String, message: String },

    /// HTTP server failed to start or stopped abnormally
    #[error("HTTP server failed on {addr}: {message}")]
    Server { addr: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_address(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            message: message.into(),
        }
    }

    pub fn server(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            addr: addr.into(),
            message: message.into(),
        }
    }
}
