//! `serve` command implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use access_gate::AccessGate;
use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use ingress::AppState;
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::error::CliError;
use crate::warnings::collect_warnings;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding listen host from CLI");
        blueprint.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = port, "Overriding listen port from CLI");
        blueprint.server.port = port;
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        addr = %blueprint.bind_addr(),
        allowed_origins = blueprint.access.allowed_origins.len(),
        targets = blueprint.targets.len(),
        recorder = ?blueprint.recorder.kind,
        "Configuration loaded"
    );
    for warning in collect_warnings(&blueprint) {
        warn!("{}", warning);
    }

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let addr_text = blueprint.bind_addr();
    let addr: SocketAddr = addr_text
        .parse()
        .map_err(|e: std::net::AddrParseError| CliError::invalid_address(&addr_text, e.to_string()))?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    info!(allowed_origins = ?blueprint.access.allowed_origins, "Origin allow-list");
    let gate = AccessGate::from_config(&blueprint.access);
    let dispatcher = Arc::new(
        dispatcher::create_dispatcher(&blueprint)
            .await
            .context("Failed to build dispatcher")?,
    );

    let state = AppState::new(
        gate,
        Arc::clone(&dispatcher),
        blueprint.server.welcome_message.clone(),
        Duration::from_secs(blueprint.server.request_timeout_secs),
    );

    ingress::start_server(state, addr, ingress::shutdown_signal())
        .await
        .map_err(|e| CliError::server(&addr_text, e.to_string()))?;

    let grace = Duration::from_secs(blueprint.dispatch.shutdown_grace_secs);
    // connection tasks may still hold the state; the drain does not need them gone
    for (target, snapshot) in dispatcher.shutdown(grace).await {
        info!(
            target_name = %target,
            delivered = snapshot.delivered_count,
            failed = snapshot.failure_count,
            dropped = snapshot.dropped_count,
            "Target totals"
        );
    }

    info!("wo-relay finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Listen: {}", blueprint.bind_addr());
    println!(
        "Delay: floor {} ms, step {} ms, ceiling {} ms",
        blueprint.delay.floor_ms, blueprint.delay.step_ms, blueprint.delay.ceiling_ms
    );

    println!("\nAllowed origins ({}):", blueprint.access.allowed_origins.len());
    for origin in &blueprint.access.allowed_origins {
        println!("  - {}", origin);
    }

    if !blueprint.targets.is_empty() {
        println!("\nTargets ({}):", blueprint.targets.len());
        for target in &blueprint.targets {
            println!(
                "  - {} ({:?}, {:?})",
                target.name, target.target_type, target.shape
            );
        }
    }

    println!("\nRecorder: {:?}", blueprint.recorder.kind);
    println!();
}
