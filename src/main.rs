// Allow dead code - some accessors are kept for API completeness
#![allow(dead_code)]

//! Ict Monitor
//!
//! Sidecar service that watches a running Ict node through its REST API.
//! It keeps a reconciled neighbor table with per-round stats and derived
//! identities, and serves status, configuration and metrics endpoints for
//! the node GUI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ICT MONITOR                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Sync Service (60s)         ←── Polls the Ict REST API     │
//! │  Neighbor Registry          ←── Reconciled neighbor view   │
//! │  Identity Generator         ←── Stable UUIDs for peers     │
//! │  Configuration Validator    ←── Screens operator documents │
//! │  HTTP API (2188)            ←── Status and metrics         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, error};

mod config;
mod types;
mod identity;
mod stats;
mod registry;
mod node_client;
mod validate;
mod monitor;
mod migrate;
mod api;

use api::Metrics;
use config::MonitorConfig;
use monitor::{NodeMonitor, SyncService};
use node_client::NodeClient;

/// Ict Monitor - Sidecar monitor for an Ict node
#[derive(Parser, Debug)]
#[command(name = "ict-monitor")]
#[command(author = "Ict Monitor Contributors")]
#[command(version = "0.6.0")]
#[command(about = "Sidecar monitor for an Ict node's REST API", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ict-monitor.toml")]
    config: PathBuf,

    /// Ict REST API port (overrides the config file)
    #[arg(long)]
    node_port: Option<u16>,

    /// Port for the monitor's own HTTP API (overrides the config file)
    #[arg(long)]
    api_port: Option<u16>,

    /// Seconds between sync cycles (overrides the config file)
    #[arg(long)]
    sync_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Validate the configuration against the node and exit
    #[arg(long)]
    check: bool,

    /// Run a single sync cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into())
        )
        .init();

    info!("🌐 Ict Monitor v{}", env!("CARGO_PKG_VERSION"));

    // Adopt a previous release's configuration file if none exists yet
    if let Err(e) = migrate::migrate_if_missing(&args.config) {
        warn!("Configuration migration failed: {}", e);
    }

    // Load configuration
    let config = if args.config.exists() {
        MonitorConfig::load(&args.config)?
    } else {
        warn!("Config file not found, using defaults");
        MonitorConfig::default()
    };

    // Override config with CLI args
    let config = config
        .with_node_rest_port(args.node_port)
        .with_api_port(args.api_port)
        .with_sync_interval_secs(args.sync_interval);

    config.validate()?;

    info!("⚙️  Configuration:");
    info!("   Node REST API: {}:{}", config.node_rest_host, config.node_rest_port);
    info!("   Sync interval: {}s", config.sync_interval_secs);
    info!("   Unreachable policy: {:?}", config.unreachable_policy);
    info!("   API port: {}", config.api_port);

    if args.check {
        return run_check(&config).await;
    }

    // Initialize metrics and the monitor
    let metrics = Arc::new(Metrics::new());
    let monitor = Arc::new(NodeMonitor::new(
        config,
        Some(args.config.clone()),
        metrics.clone(),
    )?);

    if args.once {
        monitor.sync_all().await;
        let metadata = monitor.metadata().await;
        info!(
            "📊 Synced once: node version '{}', {} neighbors",
            metadata.version,
            monitor.neighbors().len()
        );
        return Ok(());
    }

    // Start the periodic sync and the HTTP API
    let sync_service = SyncService::new(monitor.clone());
    sync_service.start().await;

    let api_handle = tokio::spawn(api::run_api_server(monitor.clone(), metrics.clone()));

    info!("✅ All services started");
    info!("   Press Ctrl+C to shutdown gracefully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
        }
        result = api_handle => {
            error!("HTTP API exited: {:?}", result);
        }
    }

    sync_service.stop();

    info!("👋 Ict Monitor shutting down");
    Ok(())
}

/// Validate the configuration document against the running node
async fn run_check(config: &MonitorConfig) -> anyhow::Result<()> {
    let client = NodeClient::new(
        &config.node_rest_host,
        std::time::Duration::from_secs(config.request_timeout_secs),
    )?;

    match validate::validate(&config.to_document(), &client).await {
        Ok(()) => {
            info!("✅ Configuration is valid, node reachable");
            Ok(())
        }
        Err(rejection) => Err(rejection.into()),
    }
}
