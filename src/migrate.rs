//! Configuration Migration
//!
//! Adopts the configuration file left behind by a previous release when no
//! current file exists yet. Candidates are probed newest-first and the
//! current file is never overwritten.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prior releases whose configuration files are adopted, newest first
pub const PREVIOUS_VERSIONS: [&str; 4] = ["0.5.3", "0.5.2", "0.5.1", "0.5"];

/// Copy the newest previous-release configuration into place.
///
/// Returns `Ok(true)` when a candidate was adopted, `Ok(false)` when the
/// current file already exists or no candidate was found.
pub fn migrate_if_missing(config_path: &Path) -> anyhow::Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    for candidate in candidates(config_path) {
        if candidate.exists() {
            std::fs::copy(&candidate, config_path)?;
            info!(
                "📦 Migrated configuration from previous release: {}",
                candidate.display()
            );
            return Ok(true);
        }
    }

    debug!("No previous-release configuration found to migrate");
    Ok(false)
}

fn candidates(config_path: &Path) -> Vec<PathBuf> {
    let stem = config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ict-monitor".to_string());
    let extension = config_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "toml".to_string());

    PREVIOUS_VERSIONS
        .iter()
        .map(|version| config_path.with_file_name(format!("{stem}-{version}.{extension}")))
        .collect()
}
