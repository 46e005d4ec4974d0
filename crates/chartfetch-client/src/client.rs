//! Unified chart client trait
//!
//! Provides a single interface over HTTP repositories and OCI registries

use async_trait::async_trait;

use crate::builder::{HttpClientBuilder, OciClientBuilder};
use crate::config::ClientOptions;
use crate::error::{ChartError, Result};

/// Unified chart client trait
#[async_trait]
pub trait ChartClient: Send + Sync {
    /// Get the backend kind
    fn backend(&self) -> Backend;

    /// Get the repository or registry URL
    fn url(&self) -> &str;

    /// Download the archive of a chart version
    async fn get_chart(&self, name: &str, version: &str) -> Result<Vec<u8>>;

    /// List the versions of a chart, ascending by semver precedence
    async fn list_versions(&self, name: &str) -> Result<Vec<String>>;

    /// Log into the remote store
    ///
    /// Both backends authenticate while being built, so this is a no-op.
    async fn login(&self) -> Result<()>;
}

/// Backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// HTTP repository with index.yaml
    Http,

    /// OCI-compliant registry
    Oci,
}

impl Backend {
    /// Detect the backend from the URL scheme
    pub fn detect(url: &str) -> Result<Self> {
        if url.starts_with("oci://") {
            Ok(Backend::Oci)
        } else if url.starts_with("https://") || url.starts_with("http://") {
            Ok(Backend::Http)
        } else {
            let scheme = url
                .split_once("://")
                .map(|(scheme, _)| scheme)
                .unwrap_or_default();
            Err(ChartError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Http => write!(f, "HTTP"),
            Backend::Oci => write!(f, "OCI"),
        }
    }
}

/// Build a client for `url`, picking the backend by scheme
pub async fn connect(url: &str, options: ClientOptions) -> Result<Box<dyn ChartClient>> {
    match Backend::detect(url)? {
        Backend::Http => {
            let client = HttpClientBuilder::new(url).with_options(options).build()?;
            Ok(Box::new(client))
        }
        Backend::Oci => {
            let client = OciClientBuilder::new(url)
                .with_options(options)
                .build()
                .await?;
            Ok(Box::new(client))
        }
    }
}
