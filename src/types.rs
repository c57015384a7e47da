//! Core types for Ict node monitoring
//!
//! These types mirror the shapes exchanged with the Ict REST API plus the
//! reconciled neighbor view this monitor maintains on top of them.

use serde::{Deserialize, Serialize};

// =============================================================================
// WIRE TYPES (Ict REST API responses)
// =============================================================================

/// One timestamped snapshot of per-neighbor traffic counters
///
/// The Ict node reports a rolling history of these per neighbor; which entry
/// of the history is authoritative depends on the node version (see the stats
/// module).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Round timestamp (Unix epoch milliseconds)
    pub timestamp: u64,

    /// All transactions seen from this neighbor in the round
    pub all: u64,

    /// Transactions seen for the first time
    pub new: u64,

    /// Transactions ignored (duplicates within the round)
    pub ignored: u64,

    /// Transactions that failed validation
    pub invalid: u64,

    /// Transactions this node requested from the neighbor
    pub requested: u64,
}

/// One neighbor as reported by the node's `getNeighbors` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteNeighbor {
    /// The address the node holds for this neighbor
    pub address: String,

    /// Rolling stats history, oldest first; some node builds omit the key
    #[serde(default)]
    pub stats: Vec<StatsRecord>,
}

/// Response shape of the node's `getInfo` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub version: String,
}

/// Response shape of the node's `getConfig` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigInfo {
    pub round_duration: u64,
}

// =============================================================================
// RECONCILED VIEW
// =============================================================================

/// One peer connection as reconciled by this monitor
///
/// Created either from operator configuration or from the node's reported
/// neighbor list; the whole set is atomically replaced after each successful
/// sync, so a value is never mutated while a reader holds a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// The address used as the stable merge key; immutable once created
    pub static_address: String,

    /// Operator-declared externally reachable address; empty means unset
    pub public_address: String,

    /// Derived identifier; None until a sync or config apply computes it
    pub identity: Option<String>,

    /// Latest observed round timestamp (Unix epoch milliseconds)
    pub timestamp: u64,

    /// Latest observed traffic counters
    pub total_count: u64,
    pub new_count: u64,
    pub ignored_count: u64,
    pub invalid_count: u64,
    pub requested_count: u64,
}

impl Neighbor {
    /// Create a neighbor with no observed data yet
    pub fn new(static_address: impl Into<String>) -> Self {
        Self {
            static_address: static_address.into(),
            public_address: String::new(),
            identity: None,
            timestamp: 0,
            total_count: 0,
            new_count: 0,
            ignored_count: 0,
            invalid_count: 0,
            requested_count: 0,
        }
    }

    /// Overwrite the counters from one stats record
    pub fn apply_stats(&mut self, record: &StatsRecord) {
        self.timestamp = record.timestamp;
        self.total_count = record.all;
        self.new_count = record.new;
        self.ignored_count = record.ignored;
        self.invalid_count = record.invalid;
        self.requested_count = record.requested;
    }

    /// The address identity derivation should use: the public address when
    /// declared, the static address otherwise
    pub fn effective_address(&self) -> &str {
        if self.public_address.is_empty() {
            &self.static_address
        } else {
            &self.public_address
        }
    }
}

/// One neighbor entry in the operator-facing configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEntry {
    /// Static address (merge key)
    pub address: String,

    /// Declared public address; serialized even when empty so round-trips
    /// keep the key present
    #[serde(default, rename = "publicAddress")]
    pub public_address: String,
}

// =============================================================================
// CACHED NODE METADATA
// =============================================================================

/// Last-known node facts, updated opportunistically on sync
///
/// Stale values are retained when a refresh fails; consumers must treat them
/// as best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Node version string as reported by `getInfo`; empty until first seen
    pub version: String,

    /// Round duration in milliseconds as reported by `getConfig`
    pub round_duration_ms: u64,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            version: String::new(),
            round_duration_ms: 60_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_apply_stats() {
        let mut neighbor = Neighbor::new("example.org:14265");
        let record = StatsRecord {
            timestamp: 1_700_000_000_000,
            all: 42,
            new: 30,
            ignored: 7,
            invalid: 1,
            requested: 4,
        };

        neighbor.apply_stats(&record);

        assert_eq!(neighbor.timestamp, 1_700_000_000_000);
        assert_eq!(neighbor.total_count, 42);
        assert_eq!(neighbor.new_count, 30);
        assert_eq!(neighbor.ignored_count, 7);
        assert_eq!(neighbor.invalid_count, 1);
        assert_eq!(neighbor.requested_count, 4);
    }

    #[test]
    fn test_effective_address_prefers_public() {
        let mut neighbor = Neighbor::new("10.0.0.1:1337");
        assert_eq!(neighbor.effective_address(), "10.0.0.1:1337");

        neighbor.public_address = "node.example.org:1337".to_string();
        assert_eq!(neighbor.effective_address(), "node.example.org:1337");
    }

    #[test]
    fn test_remote_neighbor_tolerates_missing_stats() {
        let remote: RemoteNeighbor =
            serde_json::from_str(r#"{"address": "10.0.0.1:1337"}"#).unwrap();
        assert_eq!(remote.address, "10.0.0.1:1337");
        assert!(remote.stats.is_empty());
    }

    #[test]
    fn test_neighbor_entry_round_trip_keeps_keys() {
        let entry = NeighborEntry {
            address: "10.0.0.1:1337".to_string(),
            public_address: String::new(),
        };

        let encoded = serde_json::to_string(&entry).unwrap();
        assert!(encoded.contains("\"publicAddress\""));

        let decoded: NeighborEntry = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_node_metadata_default() {
        let meta = NodeMetadata::default();
        assert!(meta.version.is_empty());
        assert_eq!(meta.round_duration_ms, 60_000);
    }
}
