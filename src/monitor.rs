//! Reconciliation engine
//!
//! Keeps the monitor's view of the node fresh:
//! - `sync_config` / `sync_info` refresh the cached node metadata
//! - `sync_neighbors` rebuilds the neighbor table from what the node reports
//! - `apply_configuration` validates and commits operator changes
//!
//! Every remote failure is absorbed here: a sync never raises, it keeps the
//! last-good data and logs. `SyncService` drives `sync_all` on a fixed timer.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::Metrics;
use crate::config::{
    MonitorConfig, UnreachablePolicy, DEFAULT_PUBLIC_ADDRESS, PROP_NAME, PROP_NEIGHBORS,
    PROP_PUBLIC_ADDRESS, PROP_REST_PASSWORD, PROP_REST_PORT,
};
use crate::identity;
use crate::node_client::{NodeApi, NodeClient};
use crate::registry::NeighborRegistry;
use crate::types::{Neighbor, NeighborEntry, NodeMetadata};
use crate::validate::{self, InvalidProperty};

/// The monitor's reconciled view of one Ict node
pub struct NodeMonitor {
    /// Active configuration
    config: RwLock<MonitorConfig>,

    /// Where an accepted configuration is persisted; None disables that
    config_path: Option<PathBuf>,

    /// Node REST API access
    client: Arc<dyn NodeApi>,

    /// Reconciled neighbor table
    registry: NeighborRegistry,

    /// Last-known node version and round duration
    metadata: RwLock<NodeMetadata>,

    /// Own identity, derived from the configured public address
    identity: RwLock<Option<String>>,

    /// Shared metrics collector
    metrics: Arc<Metrics>,
}

impl NodeMonitor {
    /// Create a monitor talking HTTP to the node named in `config`
    pub fn new(
        config: MonitorConfig,
        config_path: Option<PathBuf>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let client = NodeClient::new(
            &config.node_rest_host,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self::with_client(
            config,
            config_path,
            Arc::new(client),
            metrics,
        ))
    }

    /// Create a monitor over an arbitrary node API implementation
    pub fn with_client(
        config: MonitorConfig,
        config_path: Option<PathBuf>,
        client: Arc<dyn NodeApi>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let registry = NeighborRegistry::new();
        registry.upsert_from_config(&config.neighbors);

        // The placeholder public address means "not configured yet"
        let identity = if config.public_address.is_empty()
            || config.public_address == DEFAULT_PUBLIC_ADDRESS
        {
            None
        } else {
            Some(identity::generate(&config.public_address))
        };

        Self {
            config: RwLock::new(config),
            config_path,
            client,
            registry,
            metadata: RwLock::new(NodeMetadata::default()),
            identity: RwLock::new(identity),
            metrics,
        }
    }

    /// Refresh the cached round duration
    pub async fn sync_config(&self) {
        let (port, password) = self.credentials().await;

        self.metrics.inc_remote_calls();
        match self.client.get_config(port, &password).await {
            Some(node_config) => {
                self.metadata.write().await.round_duration_ms = node_config.round_duration;
            }
            None => {
                self.metrics.inc_remote_failures();
                debug!("Node config not available, keeping last round duration");
            }
        }
    }

    /// Refresh the cached node version
    pub async fn sync_info(&self) {
        let (port, password) = self.credentials().await;

        self.metrics.inc_remote_calls();
        match self.client.get_info(port, &password).await {
            Some(node_info) => {
                self.metadata.write().await.version = node_info.version;
            }
            None => {
                self.metrics.inc_remote_failures();
                debug!("Node info not available, keeping last version");
            }
        }
    }

    /// Reconcile the neighbor table against what the node reports
    ///
    /// Stats are picked for the node version cached at the start of this
    /// step, set by an earlier `sync_info`.
    pub async fn sync_neighbors(&self) {
        let version = self.metadata.read().await.version.clone();
        let (port, password) = self.credentials().await;
        let policy = self.config.read().await.unreachable_policy;

        self.metrics.inc_remote_calls();
        match self.client.get_neighbors(port, &password).await {
            Some(remote) => {
                self.registry.replace_from_remote(&remote, &version);
            }
            None => {
                self.metrics.inc_remote_failures();
                match policy {
                    UnreachablePolicy::Clear => {
                        warn!("Node unreachable, clearing the neighbor table");
                        self.registry.replace_from_remote(&[], &version);
                    }
                    UnreachablePolicy::Retain => {
                        debug!("Node unreachable, retaining last known neighbors");
                    }
                }
            }
        }
    }

    /// One full reconciliation cycle
    pub async fn sync_all(&self) {
        self.sync_config().await;
        self.sync_info().await;
        self.sync_neighbors().await;
        self.metrics.inc_sync_cycles();

        debug!(
            "Sync cycle complete: {} neighbors, node version '{}'",
            self.registry.len(),
            self.metadata.read().await.version
        );
    }

    /// Validate and commit a proposed configuration document
    ///
    /// All rules must pass before anything is touched; on success the new
    /// configuration is persisted to the config file.
    pub async fn apply_configuration(
        &self,
        proposed: &serde_json::Value,
    ) -> Result<(), InvalidProperty> {
        if let Err(rejection) = validate::validate(proposed, self.client.as_ref()).await {
            self.metrics.inc_configs_rejected();
            return Err(rejection);
        }

        // Rules passed, so the required fields are present and well formed
        let entries = validate::neighbor_entries(proposed)?;

        let mut config = self.config.write().await;
        if let Some(port) = proposed.get(PROP_REST_PORT).and_then(|v| v.as_u64()) {
            config.node_rest_port = port as u16;
        }
        if let Some(password) = proposed.get(PROP_REST_PASSWORD).and_then(|v| v.as_str()) {
            config.node_rest_password = password.to_string();
        }
        if let Some(name) = proposed.get(PROP_NAME).and_then(|v| v.as_str()) {
            config.display_name = name.to_string();
        }
        if let Some(address) = proposed.get(PROP_PUBLIC_ADDRESS).and_then(|v| v.as_str()) {
            config.public_address = address.to_string();
            *self.identity.write().await = Some(identity::generate(address));
        }

        config.neighbors = entries.clone();
        self.registry.upsert_from_config(&entries);

        if let Some(path) = &self.config_path {
            if let Err(e) = config.save(path) {
                warn!("Failed to persist configuration to {}: {}", path.display(), e);
            }
        }
        drop(config);

        self.metrics.inc_configs_applied();
        info!("📝 Configuration applied");
        Ok(())
    }

    /// Render the current configuration document
    ///
    /// Resyncs the neighbor table first so the served list reflects what the
    /// node reports right now.
    pub async fn get_configuration(&self) -> serde_json::Value {
        self.sync_neighbors().await;

        let entries: Vec<NeighborEntry> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|neighbor| NeighborEntry {
                address: neighbor.static_address,
                public_address: neighbor.public_address,
            })
            .collect();
        let encoded = serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string());

        let config = self.config.read().await;
        serde_json::json!({
            (PROP_REST_PORT): config.node_rest_port,
            (PROP_REST_PASSWORD): config.node_rest_password,
            (PROP_NAME): config.display_name,
            (PROP_NEIGHBORS): encoded,
            (PROP_PUBLIC_ADDRESS): config.public_address,
        })
    }

    /// Snapshot of the reconciled neighbor table
    pub fn neighbors(&self) -> Vec<Neighbor> {
        self.registry.snapshot()
    }

    /// Last-known node metadata
    pub async fn metadata(&self) -> NodeMetadata {
        self.metadata.read().await.clone()
    }

    /// Own identity, if a public address has been configured
    pub async fn identity(&self) -> Option<String> {
        self.identity.read().await.clone()
    }

    /// Copy of the active configuration
    pub async fn config(&self) -> MonitorConfig {
        self.config.read().await.clone()
    }

    async fn credentials(&self) -> (u16, String) {
        let config = self.config.read().await;
        (config.node_rest_port, config.node_rest_password.clone())
    }
}

// =============================================================================
// SYNC SERVICE
// =============================================================================

/// Service that runs a reconciliation cycle on a fixed timer
pub struct SyncService {
    /// Monitor being driven
    monitor: Arc<NodeMonitor>,

    /// Whether the service is running
    running: Arc<AtomicBool>,
}

impl SyncService {
    /// Create a new sync service
    pub fn new(monitor: Arc<NodeMonitor>) -> Self {
        Self {
            monitor,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the timer loop
    pub async fn start(&self) {
        use std::sync::atomic::Ordering;

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync service already running");
            return;
        }

        let monitor = self.monitor.clone();
        let running = self.running.clone();
        let interval_secs = self.monitor.config().await.sync_interval_secs;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

            info!("🔄 Sync service started (interval: {}s)", interval_secs);

            while running.load(Ordering::SeqCst) {
                interval.tick().await;
                monitor.sync_all().await;
            }

            info!("🔄 Sync service stopped");
        });
    }

    /// Stop the timer loop
    pub fn stop(&self) {
        use std::sync::atomic::Ordering;
        self.running.store(false, Ordering::SeqCst);
    }
}
