//! Identity derivation for neighbors
//!
//! Identities are name-based UUIDs (v5) under a fixed namespace, so the same
//! address maps to the same identity across restarts and across monitor
//! instances observing the same peer.

use uuid::Uuid;

/// Namespace all addresses are hashed under; fixed for the lifetime of the
/// protocol since changing it would change every derived identity
const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x1cf1_41e4_5f1a_4f2b_9d0e_7a3b_c25d_68a1);

/// Derive the stable identity for a network address
///
/// Deterministic and total: any address string yields an identity, and the
/// same address always yields the same one.
pub fn generate(address: &str) -> String {
    Uuid::new_v5(&IDENTITY_NAMESPACE, address.as_bytes()).to_string()
}
