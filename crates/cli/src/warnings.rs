//! Non-fatal configuration findings shared by `serve`, `validate` and `info`

use contracts::{RecorderKind, RelayBlueprint, TargetType};

/// Collect configuration warnings (non-fatal issues)
pub fn collect_warnings(blueprint: &RelayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.targets.is_empty() {
        warnings.push("No targets configured - accepted work orders go nowhere".to_string());
    }

    if blueprint.access.allowed_origins.is_empty() {
        warnings.push(
            "access.allowed_origins is empty - only callers without an Origin header get CORS access"
                .to_string(),
        );
    }

    let allow_list = access_gate::AllowList::from(&blueprint.access);
    for entry in allow_list.range_like_entries() {
        warnings.push(format!(
            "Allow-list entry '{entry}' looks like a network range; it only matches that literal Origin"
        ));
    }

    if blueprint.recorder.kind == RecorderKind::None {
        warnings.push("Recorder disabled - raw work orders are not recorded".to_string());
    }

    for target in &blueprint.targets {
        if target.target_type == TargetType::Log {
            warnings.push(format!(
                "Target '{}' is a log target - payloads are only logged",
                target.name
            ));
        }
    }

    warnings
}
