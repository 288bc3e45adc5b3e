//! Configuration for the manifest engine

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
///
/// Thresholds mirror the external record format: a single record must stay
/// under the serialized byte budget, and no directory may exceed the entry
/// cap. Collection names identify where manifests and their sub-records
/// live in the owner's repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Serialized record byte budget before a manifest is split
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,

    /// Maximum entries a single directory may hold
    #[serde(default = "default_max_directory_entries")]
    pub max_directory_entries: usize,

    /// Concurrent per-file operations against the external store
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Collection holding site manifest records
    #[serde(default = "default_fs_collection")]
    pub fs_collection: String,

    /// Collection holding split-out subtree records
    #[serde(default = "default_subfs_collection")]
    pub subfs_collection: String,
}

fn default_max_record_bytes() -> usize {
    150 * 1024
}

fn default_max_directory_entries() -> usize {
    500
}

fn default_upload_concurrency() -> usize {
    5
}

fn default_fs_collection() -> String {
    "dev.siteweave.fs".to_string()
}

fn default_subfs_collection() -> String {
    "dev.siteweave.subfs".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_record_bytes: default_max_record_bytes(),
            max_directory_entries: default_max_directory_entries(),
            upload_concurrency: default_upload_concurrency(),
            fs_collection: default_fs_collection(),
            subfs_collection: default_subfs_collection(),
        }
    }
}

impl EngineConfig {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_record_bytes, 150 * 1024);
        assert_eq!(config.max_directory_entries, 500);
        assert_eq!(config.upload_concurrency, 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("max_record_bytes = 1024").unwrap();
        assert_eq!(config.max_record_bytes, 1024);
        assert_eq!(config.max_directory_entries, 500);
        assert_eq!(config.fs_collection, "dev.siteweave.fs");
    }
}
