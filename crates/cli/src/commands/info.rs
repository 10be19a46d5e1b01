//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{PayloadShape, RelayBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    server: ServerInfo,
    allowed_origins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    range_like_origins: Vec<String>,
    delay: DelayInfo,
    recorder: String,
    targets: Vec<TargetInfo>,
}

#[derive(Serialize)]
struct ServerInfo {
    listen: String,
    request_timeout_secs: u64,
    shutdown_grace_secs: u64,
}

#[derive(Serialize)]
struct DelayInfo {
    floor_ms: u64,
    step_ms: u64,
    ceiling_ms: u64,
    max_delay_ms: u64,
}

#[derive(Serialize)]
struct TargetInfo {
    name: String,
    target_type: String,
    shape: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    envelope: Option<String>,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args.params);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args.params);
    }

    Ok(())
}

fn describe_shape(shape: &PayloadShape) -> String {
    match shape {
        PayloadShape::Raw => "raw".to_string(),
        PayloadShape::Flatten { field } => format!("flatten({field})"),
    }
}

fn build_config_info(blueprint: &RelayBlueprint, with_params: bool) -> ConfigInfo {
    let allow_list = access_gate::AllowList::from(&blueprint.access);
    let delay = blueprint.delay;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        server: ServerInfo {
            listen: blueprint.bind_addr(),
            request_timeout_secs: blueprint.server.request_timeout_secs,
            shutdown_grace_secs: blueprint.dispatch.shutdown_grace_secs,
        },
        allowed_origins: blueprint.access.allowed_origins.clone(),
        range_like_origins: allow_list
            .range_like_entries()
            .into_iter()
            .map(String::from)
            .collect(),
        delay: DelayInfo {
            floor_ms: delay.floor_ms,
            step_ms: delay.step_ms,
            ceiling_ms: delay.ceiling_ms,
            max_delay_ms: delay.ceiling_ms.saturating_add(delay.step_ms),
        },
        recorder: format!("{:?}", blueprint.recorder.kind),
        targets: blueprint
            .targets
            .iter()
            .map(|t| TargetInfo {
                name: t.name.to_string(),
                target_type: format!("{:?}", t.target_type),
                shape: describe_shape(&t.shape),
                envelope: t.envelope.clone(),
                queue_capacity: t.queue_capacity,
                params: if with_params {
                    t.params.clone()
                } else {
                    HashMap::new()
                },
            })
            .collect(),
    }
}

fn print_config_info(blueprint: &RelayBlueprint, with_params: bool) {
    let info = build_config_info(blueprint, with_params);

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Work-Order Relay Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Server");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Listen: {}", info.server.listen);
    println!("   ├─ Request timeout: {}s", info.server.request_timeout_secs);
    println!("   └─ Shutdown grace: {}s", info.server.shutdown_grace_secs);

    println!("\n🔒 Allowed origins ({})", info.allowed_origins.len());
    for (i, origin) in info.allowed_origins.iter().enumerate() {
        let prefix = if i == info.allowed_origins.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        let note = if info.range_like_origins.contains(origin) {
            "  (literal match only)"
        } else {
            ""
        };
        println!("   {} {}{}", prefix, origin, note);
    }

    println!("\n⏱  Delay");
    println!(
        "   └─ {} ms + {} ms per event, reset after {} ms (max {} ms)",
        info.delay.floor_ms, info.delay.step_ms, info.delay.ceiling_ms, info.delay.max_delay_ms
    );

    println!("\n📝 Recorder: {}", info.recorder);

    println!("\n📤 Targets ({})", info.targets.len());
    for (i, target) in info.targets.iter().enumerate() {
        let is_last = i == info.targets.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };
        println!(
            "   {} {} ({}, {})",
            prefix, target.name, target.target_type, target.shape
        );
        if let Some(ref envelope) = target.envelope {
            println!("   {}  ├─ envelope: {}", child_prefix, envelope);
        }
        for (key, value) in &target.params {
            println!("   {}  ├─ {}: {}", child_prefix, key, value);
        }
        println!("   {}  └─ queue: {}", child_prefix, target.queue_capacity);
    }

    println!();
}
