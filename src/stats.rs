//! Stats record selection across node versions
//!
//! The node reports a rolling stats history per neighbor. Version "0.5" ends
//! the history with the settled round; later versions append a provisional
//! record for the round still in progress. The extractor compensates for that
//! drift so callers always receive the settled record, or nothing.

use crate::types::StatsRecord;

/// Distance from the end of the history to the settled record, per version
const VERSION_OFFSETS: &[(&str, usize)] = &[("0.5", 0)];

/// Offset for any version not listed above, including unknown or empty ones
const DEFAULT_OFFSET: usize = 1;

fn offset_for(node_version: &str) -> usize {
    VERSION_OFFSETS
        .iter()
        .find(|(version, _)| *version == node_version)
        .map(|(_, offset)| *offset)
        .unwrap_or(DEFAULT_OFFSET)
}

/// Pick the record that is authoritative under the given node version
///
/// Returns None when the history is too short to hold a settled record.
pub fn extract<'a>(node_version: &str, history: &'a [StatsRecord]) -> Option<&'a StatsRecord> {
    let offset = offset_for(node_version);
    history
        .len()
        .checked_sub(offset + 1)
        .map(|index| &history[index])
}
