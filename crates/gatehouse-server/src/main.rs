//! The Gatehouse gateway daemon.
//!
//! Boots the dispatcher stack from external configuration and serves the
//! JSON-RPC API over WebSocket until interrupted. The stock catalog runs
//! against in-memory demo collaborators, so the daemon is fully usable
//! without any real domain systems behind it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gatehouse_audit::{AuditLog, TracingSink};
use gatehouse_authz::RoleAuthorizer;
use gatehouse_confirm::ConfirmationBroker;
use gatehouse_dispatch::{Dispatcher, PolicyResolutionGate};
use gatehouse_server::GatewayServer;
use gatehouse_server::demo;
use gatehouse_server::telemetry::{self, LogConfig};
use gatehouse_tools::TruncationGuard;

/// Command line arguments for the gateway daemon.
#[derive(Parser, Debug)]
#[command(name = "gatehoused")]
#[command(
    author,
    version,
    about = "Tool-invocation gateway between AI agents and domain services"
)]
struct Args {
    /// Path to the gateway config file; embedded defaults apply when omitted.
    #[arg(short, long, env = "GATEHOUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 127.0.0.1:7410.
    #[arg(long)]
    listen: Option<String>,

    /// Log level: trace, debug, info, warn, or error.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: pretty, compact, or json.
    #[arg(long, default_value = "compact")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_config = LogConfig::new(&args.log_level).with_format(args.log_format.parse()?);
    telemetry::setup_logging(&log_config).context("failed to initialize logging")?;

    let config =
        gatehouse_config::load(args.config.as_deref()).context("failed to load gateway config")?;
    let listen_addr = args
        .listen
        .unwrap_or_else(|| config.server.listen_addr.clone());

    let registry = Arc::new(
        demo::demo_registry(config.descriptors().context("invalid tool catalog")?)
            .context("failed to build tool registry")?,
    );
    info!(tools = registry.len(), "tool catalog ready");

    let authorizer = Arc::new(
        RoleAuthorizer::from_descriptors(registry.descriptors())
            .context("failed to build permission matrix")?,
    );
    let gate = PolicyResolutionGate::from_config(
        &config.resolution,
        Arc::clone(&registry),
        Arc::clone(&authorizer),
    );
    let broker = Arc::new(
        ConfirmationBroker::new(Arc::new(gate))
            .with_ttl_secs(config.limits.confirmation_ttl_secs)
            .with_retention_secs(config.limits.resolved_retention_secs),
    );

    let dispatcher = Arc::new(
        Dispatcher::new(registry, authorizer, broker)
            .with_truncation_guard(TruncationGuard::new(config.limits.truncation_threshold))
            .with_retry_backoff_ms(config.limits.read_retry_backoff_ms)
            .with_audit(AuditLog::new().with_sink(Arc::new(TracingSink::new()))),
    );

    let server = GatewayServer::new(dispatcher);
    let (handle, addr) = server
        .start(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    let sweep = server.spawn_sweep_loop(config.limits.sweep_interval_secs);
    info!(%addr, "gatehoused ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");

    sweep.abort();
    handle.stop()?;
    handle.stopped().await;
    Ok(())
}
