//! Config validation
//!
//! Rules:
//! - server.port != 0, request timeout > 0
//! - delay.step_ms > 0, floor_ms <= ceiling_ms
//! - target names non-empty and unique
//! - http targets have a `url`, numeric params parse
//! - flatten field and envelope non-empty
//! - queue capacities > 0
//! - file recorder has a `path`

use std::collections::HashSet;

use contracts::{
    PayloadShape, RecorderKind, RelayBlueprint, RelayError, TargetConfig, TargetType,
};

/// Validate a RelayBlueprint
///
/// Returns the first error found, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    validate_server(blueprint)?;
    validate_delay(blueprint)?;
    validate_dispatch(blueprint)?;
    validate_recorder(blueprint)?;
    validate_target_names(blueprint)?;
    for (idx, target) in blueprint.targets.iter().enumerate() {
        validate_target(idx, target)?;
    }
    Ok(())
}

fn validate_server(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    if blueprint.server.port == 0 {
        return Err(RelayError::config_validation(
            "server.port",
            "port must be > 0",
        ));
    }
    if blueprint.server.request_timeout_secs == 0 {
        return Err(RelayError::config_validation(
            "server.request_timeout_secs",
            "request_timeout_secs must be > 0",
        ));
    }
    Ok(())
}

/// Validate the adaptive delay band
fn validate_delay(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    let delay = &blueprint.delay;

    if delay.step_ms == 0 {
        return Err(RelayError::config_validation(
            "delay.step_ms",
            "step_ms must be > 0",
        ));
    }

    if delay.floor_ms > delay.ceiling_ms {
        return Err(RelayError::config_validation(
            "delay.floor_ms / delay.ceiling_ms",
            format!(
                "floor_ms ({}) must be <= ceiling_ms ({})",
                delay.floor_ms, delay.ceiling_ms
            ),
        ));
    }

    Ok(())
}

fn validate_dispatch(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    if blueprint.dispatch.recorder_queue_capacity == 0 {
        return Err(RelayError::config_validation(
            "dispatch.recorder_queue_capacity",
            "queue capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_recorder(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    let recorder = &blueprint.recorder;
    if recorder.kind == RecorderKind::File
        && recorder.params.get("path").is_none_or(|p| p.is_empty())
    {
        return Err(RelayError::config_validation(
            "recorder.params.path",
            "file recorder requires a 'path' parameter",
        ));
    }
    Ok(())
}

/// Target names must be unique (global)
fn validate_target_names(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    let mut seen = HashSet::new();
    for (idx, target) in blueprint.targets.iter().enumerate() {
        if target.name.is_empty() {
            return Err(RelayError::config_validation(
                format!("targets[{}].name", idx),
                "target name cannot be empty",
            ));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(RelayError::config_validation(
                format!("targets[name={}]", target.name),
                "duplicate target name",
            ));
        }
    }
    Ok(())
}

fn validate_target(idx: usize, target: &TargetConfig) -> Result<(), RelayError> {
    if target.queue_capacity == 0 {
        return Err(RelayError::config_validation(
            format!("targets[{}].queue_capacity", target.name),
            "queue capacity must be > 0",
        ));
    }

    if let PayloadShape::Flatten { field } = &target.shape {
        if field.is_empty() {
            return Err(RelayError::config_validation(
                format!("targets[{}].shape.field", target.name),
                "flatten field cannot be empty",
            ));
        }
    }

    if target.envelope.as_deref() == Some("") {
        return Err(RelayError::config_validation(
            format!("targets[{}].envelope", target.name),
            "envelope key cannot be empty",
        ));
    }

    if target.target_type == TargetType::Http {
        match target.params.get("url") {
            Some(url) if !url.is_empty() => {}
            _ => {
                return Err(RelayError::config_validation(
                    format!("targets[{}].params.url", idx),
                    format!("http target '{}' requires a 'url' parameter", target.name),
                ));
            }
        }
        if let Some(timeout) = target.params.get("timeout_ms") {
            if timeout.parse::<u64>().map_or(true, |t| t == 0) {
                return Err(RelayError::config_validation(
                    format!("targets[{}].params.timeout_ms", target.name),
                    format!("timeout_ms must be a positive integer, got '{timeout}'"),
                ));
            }
        }
    }

    Ok(())
}
