//! Repository index types
//!
//! Helm-compatible `index.yaml` format. Only the fields the client reads
//! are modeled; unknown keys (timestamps, descriptions, ...) are ignored, so
//! a malformed value there cannot fail a lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::TransferError;

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryIndex {
    /// Chart versions indexed by chart name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartVersion>>,
}

impl RepositoryIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, TransferError> {
        serde_yaml::from_str(yaml).map_err(|e| TransferError::Decode(e.to_string()))
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, TransferError> {
        let yaml = std::str::from_utf8(bytes)
            .map_err(|e| TransferError::Decode(format!("invalid UTF-8: {}", e)))?;
        Self::from_yaml(yaml)
    }

    /// Get all version records of a chart
    pub fn get(&self, name: &str) -> Option<&[ChartVersion]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    /// Get the record of an exact version string
    pub fn get_version(&self, name: &str, version: &str) -> Option<&ChartVersion> {
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.version == version)
    }
}

/// One version record of a chart in the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartVersion {
    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version (semver)
    pub version: String,

    /// Download URLs, absolute or relative to the repository
    #[serde(default)]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default)]
    pub digest: Option<String>,
}

impl ChartVersion {
    /// Get the primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }
}
