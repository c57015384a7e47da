//! Monitor configuration
//!
//! Operator-facing settings: how to reach the observed Ict node, the declared
//! neighbor list, and the monitor's own behavior. Defaults match a stock Ict
//! installation; the placeholder name and public address are deliberately
//! invalid so the validator forces operators to set their own.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::NeighborEntry;

// =============================================================================
// OPERATOR-FACING DOCUMENT KEYS
// =============================================================================

// Property keys of the configuration document exchanged with the node GUI.
// These are wire names; do not rename.
pub const PROP_REST_PORT: &str = "Ict REST API Port";
pub const PROP_REST_PASSWORD: &str = "Ict REST API Password";
pub const PROP_NAME: &str = "Name";
pub const PROP_NEIGHBORS: &str = "Neighbors";
pub const PROP_PUBLIC_ADDRESS: &str = "Public address";

/// Stock Ict REST API port
pub const DEFAULT_REST_PORT: u16 = 2187;

/// Stock Ict REST API password
pub const DEFAULT_REST_PASSWORD: &str = "change_me_now";

/// Placeholder display name, rejected by validation until changed
pub const DEFAULT_DISPLAY_NAME: &str = "YOUR_NAME (ict-0)";

/// Placeholder public address, rejected by validation until changed
pub const DEFAULT_PUBLIC_ADDRESS: &str = "your.public.ict.address:1337";

/// Maximum neighbors an Ict node accepts
pub const MAX_NEIGHBORS: usize = 3;

// =============================================================================
// CONFIG
// =============================================================================

/// Behavior for the neighbor table when the node stops responding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnreachablePolicy {
    /// Treat a failed fetch like an empty neighbor list and drop the table
    #[default]
    Clear,

    /// Keep the last known table until the node responds again
    Retain,
}

/// Main configuration for the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    // === Ict node REST API ===

    /// Host the node's REST API listens on
    pub node_rest_host: String,

    /// Port of the node's REST API
    pub node_rest_port: u16,

    /// Password for the node's REST API
    pub node_rest_password: String,

    // === Operator identity ===

    /// Display name, convention "<name> (ict-<number>)"
    pub display_name: String,

    /// Externally reachable "address:port" of the observed node
    pub public_address: String,

    /// Operator-declared neighbors
    #[serde(default)]
    pub neighbors: Vec<NeighborEntry>,

    // === Sync behavior ===

    /// Interval between sync cycles (seconds)
    pub sync_interval_secs: u64,

    /// Timeout for each REST call to the node (seconds)
    pub request_timeout_secs: u64,

    /// Neighbor table behavior when the node is unreachable
    #[serde(default)]
    pub unreachable_policy: UnreachablePolicy,

    // === Monitor API ===

    /// Port for the monitor's own HTTP API
    pub api_port: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Ict node REST API - stock installation values
            node_rest_host: "localhost".to_string(),
            node_rest_port: DEFAULT_REST_PORT,
            node_rest_password: DEFAULT_REST_PASSWORD.to_string(),

            // Operator identity - placeholders until the operator configures
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            public_address: DEFAULT_PUBLIC_ADDRESS.to_string(),
            neighbors: vec![],

            // Sync behavior
            sync_interval_secs: 60,      // one Ict round
            request_timeout_secs: 10,
            unreachable_policy: UnreachablePolicy::Clear,

            // Monitor API
            api_port: 2188,  // one above the node's REST port
        }
    }
}

impl MonitorConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides; None leaves the value alone

    pub fn with_node_rest_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.node_rest_port = port;
        }
        self
    }

    pub fn with_api_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.api_port = port;
        }
        self
    }

    pub fn with_sync_interval_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.sync_interval_secs = secs;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node_rest_host.is_empty() {
            anyhow::bail!("node_rest_host must not be empty");
        }

        if self.node_rest_port == 0 {
            anyhow::bail!("node_rest_port must not be 0");
        }

        if self.api_port == 0 {
            anyhow::bail!("api_port must not be 0");
        }

        if self.sync_interval_secs == 0 {
            anyhow::bail!("sync_interval_secs must not be 0");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must not be 0");
        }

        if self.neighbors.len() > MAX_NEIGHBORS {
            anyhow::bail!(
                "{} neighbors configured, the Ict limit is {}",
                self.neighbors.len(),
                MAX_NEIGHBORS
            );
        }

        Ok(())
    }

    /// Render the operator-facing configuration document
    ///
    /// The neighbor list is string-encoded JSON inside the document, the
    /// format the node GUI exchanges.
    pub fn to_document(&self) -> serde_json::Value {
        let neighbors =
            serde_json::to_string(&self.neighbors).unwrap_or_else(|_| "[]".to_string());
        serde_json::json!({
            (PROP_REST_PORT): self.node_rest_port,
            (PROP_REST_PASSWORD): self.node_rest_password,
            (PROP_NAME): self.display_name,
            (PROP_NEIGHBORS): neighbors,
            (PROP_PUBLIC_ADDRESS): self.public_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.node_rest_port, DEFAULT_REST_PORT);
        assert_eq!(config.node_rest_password, DEFAULT_REST_PASSWORD);
        assert_eq!(config.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(config.public_address, DEFAULT_PUBLIC_ADDRESS);
        assert_eq!(config.sync_interval_secs, 60);
        assert_eq!(config.unreachable_policy, UnreachablePolicy::Clear);
        assert!(config.neighbors.is_empty());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ict-monitor.toml");

        let mut config = MonitorConfig::default();
        config.display_name = "alice (ict-1)".to_string();
        config.neighbors.push(NeighborEntry {
            address: "10.0.0.1:1337".to_string(),
            public_address: "one.example.org:1337".to_string(),
        });
        config.unreachable_policy = UnreachablePolicy::Retain;

        config.save(&path).unwrap();
        let loaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_builder_methods() {
        let config = MonitorConfig::default()
            .with_node_rest_port(Some(14265))
            .with_api_port(None)
            .with_sync_interval_secs(Some(5));

        assert_eq!(config.node_rest_port, 14265);
        assert_eq!(config.api_port, 2188);
        assert_eq!(config.sync_interval_secs, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = MonitorConfig::default();
        assert!(config.validate().is_ok());

        config.sync_interval_secs = 0;
        assert!(config.validate().is_err());

        config.sync_interval_secs = 60;
        for i in 0..4 {
            config.neighbors.push(NeighborEntry {
                address: format!("10.0.0.{i}:1337"),
                public_address: String::new(),
            });
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_document_encodes_neighbors_as_string() {
        let mut config = MonitorConfig::default();
        config.neighbors.push(NeighborEntry {
            address: "10.0.0.1:1337".to_string(),
            public_address: String::new(),
        });

        let document = config.to_document();
        assert_eq!(document[PROP_REST_PORT], 2187);

        let encoded = document[PROP_NEIGHBORS].as_str().unwrap();
        let decoded: Vec<NeighborEntry> = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, config.neighbors);
    }
}
