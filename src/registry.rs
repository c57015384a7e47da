//! Neighbor registry
//!
//! The reconciled table of known peers. The sync path and the config-apply
//! path both write here while the HTTP surface reads, so every mutation runs
//! under one lock and readers take a snapshot copy under the same lock.
//! Each sync builds a fresh set of values and swaps it in whole, so a
//! snapshot handed out earlier is never mutated behind a reader's back.

use std::sync::Mutex;
use tracing::debug;

use crate::identity;
use crate::stats;
use crate::types::{Neighbor, NeighborEntry, RemoteNeighbor};

/// In-memory neighbor table, keyed by static address
///
/// Shared via `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct NeighborRegistry {
    inner: Mutex<Vec<Neighbor>>,
}

impl NeighborRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge operator-declared entries into the table
    ///
    /// Finds an existing neighbor by static address or creates one; a
    /// non-empty declared public address overwrites the stored one. Never
    /// removes neighbors.
    pub fn upsert_from_config(&self, entries: &[NeighborEntry]) {
        let mut neighbors = self.inner.lock().unwrap();
        for entry in entries {
            if let Some(existing) = neighbors
                .iter_mut()
                .find(|n| n.static_address == entry.address)
            {
                if !entry.public_address.is_empty() {
                    existing.public_address = entry.public_address.clone();
                }
            } else {
                let mut neighbor = Neighbor::new(entry.address.clone());
                neighbor.public_address = entry.public_address.clone();
                neighbors.push(neighbor);
            }
        }
    }

    /// Rebuild the table from the node's reported neighbor list
    ///
    /// Reuses the existing value for a known static address so declared
    /// public addresses survive, applies the stats record authoritative for
    /// the node version, derives identities, and swaps the table atomically.
    /// Peers absent from `remote` are dropped.
    pub fn replace_from_remote(&self, remote: &[RemoteNeighbor], node_version: &str) {
        let mut neighbors = self.inner.lock().unwrap();
        let mut next: Vec<Neighbor> = Vec::with_capacity(remote.len());

        for reported in remote {
            let mut neighbor = neighbors
                .iter()
                .find(|n| n.static_address == reported.address)
                .cloned()
                .unwrap_or_else(|| Neighbor::new(reported.address.clone()));

            if let Some(record) = stats::extract(node_version, &reported.stats) {
                neighbor.apply_stats(record);
            }
            let derived = identity::generate(neighbor.effective_address());
            debug!(
                "Assigned identity {} to {} (derived from its {})",
                derived,
                neighbor.static_address,
                if neighbor.public_address.is_empty() {
                    "reported address"
                } else {
                    "declared public address"
                }
            );
            neighbor.identity = Some(derived);

            // A remote list carrying the same address twice collapses to the
            // last occurrence, keeping static addresses unique
            if let Some(slot) = next
                .iter_mut()
                .find(|n| n.static_address == neighbor.static_address)
            {
                *slot = neighbor;
            } else {
                next.push(neighbor);
            }
        }

        *neighbors = next;
    }

    /// Defensive copy of the current table
    pub fn snapshot(&self) -> Vec<Neighbor> {
        self.inner.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
