//! Client configuration
//!
//! Authentication and TLS options shared by both backends. Can be loaded
//! from `~/.config/chartfetch/config.yaml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChartError, Result};

/// Options consumed when a client is built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Client certificate (PEM)
    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    /// Client private key (PEM)
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// CA bundle for TLS verification (PEM)
    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    /// Skip TLS verification (insecure, not recommended)
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Talk plain HTTP to OCI registries
    #[serde(default)]
    pub plain_http: bool,
}

impl ClientOptions {
    /// Load options from default location, or defaults if absent
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load options from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = serde_yaml::from_str(&content)?;
        Ok(options)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ChartError::Config {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("chartfetch").join("config.yaml"))
    }

    /// Overlay `other` on top of these options
    ///
    /// Values set in `other` win; flags are or-ed.
    pub fn merge(mut self, other: ClientOptions) -> Self {
        self.cert_file = other.cert_file.or(self.cert_file);
        self.key_file = other.key_file.or(self.key_file);
        self.ca_file = other.ca_file.or(self.ca_file);
        self.username = other.username.or(self.username);
        self.password = other.password.or(self.password);
        self.insecure_skip_tls_verify |= other.insecure_skip_tls_verify;
        self.plain_http |= other.plain_http;
        self
    }

    /// Basic credentials, when both username and password are non-empty
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }

    /// Client certificate and key paths, when both are set
    pub fn client_identity(&self) -> Option<(&Path, &Path)> {
        match (self.cert_file.as_deref(), self.key_file.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}
