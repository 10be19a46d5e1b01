//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `RelayBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("relay.toml")).unwrap();
//! println!("Targets: {}", blueprint.targets.len());
//! ```

mod parser;
mod validator;

pub use contracts::RelayBlueprint;
pub use parser::ConfigFormat;

use contracts::RelayError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RelayBlueprint, RelayError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RelayBlueprint, RelayError> {
        Self::parse_and_validate(content, format)
    }

    /// Re-run validation, e.g. after CLI overrides were applied
    pub fn validate(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
        validator::validate(blueprint)
    }

    /// Serialize RelayBlueprint to TOML string
    pub fn to_toml(blueprint: &RelayBlueprint) -> Result<String, RelayError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| RelayError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RelayBlueprint to JSON string
    pub fn to_json(blueprint: &RelayBlueprint) -> Result<String, RelayError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| RelayError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, RelayError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            RelayError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| RelayError::config_parse(format!("unsupported config format: .{ext}")))
    }

    fn read_file(path: &Path) -> Result<String, RelayError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<RelayBlueprint, RelayError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REFERENCE_TOML: &str = r#"
[server]
port = 8080
welcome_message = "Welcome to the work order relay"

[access]
allowed_origins = [
    "http://localhost:8080",
    "https://tse.example.com",
    "151.101.0.0/16",
]

[delay]
floor_ms = 1000
step_ms = 1000
ceiling_ms = 10000

[[targets]]
name = "netsuite"
target_type = "http"
envelope = "body"
shape = { kind = "flatten", field = "location" }
params = { url = "http://127.0.0.1:9101/netsuite", timeout_ms = "10000" }

[[targets]]
name = "acumatica"
target_type = "http"
envelope = "body"
params = { url = "http://127.0.0.1:9102/acumatica" }
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(REFERENCE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.targets.len(), 2);
        assert_eq!(bp.access.allowed_origins[2], "151.101.0.0/16");
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(REFERENCE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.targets.len(), bp2.targets.len());
        assert_eq!(bp.targets[0].shape, bp2.targets[0].shape);
        assert_eq!(bp.delay, bp2.delay);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(REFERENCE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.access.allowed_origins, bp2.access.allowed_origins);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[delay]
floor_ms = 500
step_ms = 0
ceiling_ms = 1000
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("step_ms"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(REFERENCE_TOML.as_bytes()).unwrap();
        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert!(bp.target("acumatica").is_some());
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
