//! RelayBlueprint - Config Loader output
//!
//! Describes the complete relay configuration: listener, allow-list,
//! adaptive delay band, dispatch settings, recorder and targets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::TargetId;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Origin allow-list
    #[serde(default)]
    pub access: AccessConfig,

    /// Adaptive delay band
    #[serde(default)]
    pub delay: DelayConfig,

    /// Dispatcher tuning
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Raw event recorder
    #[serde(default)]
    pub recorder: RecorderConfig,

    /// Downstream targets
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Text returned by the health endpoints
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            welcome_message: default_welcome_message(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_welcome_message() -> String {
    "Welcome to the work order relay".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Origin allow-list
///
/// Entries are compared by exact string equality. Entries that look like
/// network ranges are still plain strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Adaptive delay band (milliseconds)
///
/// `value' = value + step_ms if value <= ceiling_ms else floor_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Initial and reset value
    #[serde(default = "default_floor_ms")]
    pub floor_ms: u64,

    /// Increment per accepted event
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// Upper threshold; values above it reset to the floor
    #[serde(default = "default_ceiling_ms")]
    pub ceiling_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            floor_ms: default_floor_ms(),
            step_ms: default_step_ms(),
            ceiling_ms: default_ceiling_ms(),
        }
    }
}

fn default_floor_ms() -> u64 {
    1_000
}

fn default_step_ms() -> u64 {
    1_000
}

fn default_ceiling_ms() -> u64 {
    10_000
}

/// Dispatcher tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How long shutdown waits for scheduled dispatches (seconds)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Recorder queue capacity
    #[serde(default = "default_queue_capacity")]
    pub recorder_queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace_secs(),
            recorder_queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

fn default_queue_capacity() -> usize {
    100
}

/// Raw event recorder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Recorder kind
    #[serde(default)]
    pub kind: RecorderKind,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Recorder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderKind {
    /// Recording disabled
    None,
    /// Structured log line per event
    #[default]
    Log,
    /// One JSON line per event appended to a file
    File,
}

/// Downstream target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target name
    pub name: TargetId,

    /// Target type
    pub target_type: TargetType,

    /// Payload shaping rule
    #[serde(default)]
    pub shape: PayloadShape,

    /// Wrap the shaped payload as `{ <envelope>: payload }`
    #[serde(default)]
    pub envelope: Option<String>,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Log the payload
    Log,
    /// POST the payload as JSON
    Http,
}

/// Payload shaping rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadShape {
    /// Forward the body unchanged
    #[default]
    Raw,
    /// Merge the fields of a nested object into the top level
    Flatten { field: String },
}

impl RelayBlueprint {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let delay = DelayConfig::default();
        assert!(delay.floor_ms <= delay.ceiling_ms);
        assert!(delay.step_ms > 0);
        assert_eq!(ServerConfig::default().port, 8080);
        assert_eq!(RecorderConfig::default().kind, RecorderKind::Log);
    }

    #[test]
    fn test_shape_tagged_repr() {
        let shape: PayloadShape =
            serde_json::from_str(r#"{"kind": "flatten", "field": "location"}"#).unwrap();
        assert_eq!(
            shape,
            PayloadShape::Flatten {
                field: "location".into()
            }
        );
        let raw: PayloadShape = serde_json::from_str(r#"{"kind": "raw"}"#).unwrap();
        assert_eq!(raw, PayloadShape::Raw);
    }
}
