//! HTTP repository client
//!
//! Supports Helm-style HTTP repositories publishing an `index.yaml`. The
//! index is fetched on first use and kept for the lifetime of the client;
//! build a new client to observe repository updates.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use url::Url;

use crate::client::{Backend, ChartClient};
use crate::config::ClientOptions;
use crate::error::{ChartError, Result, TransferError};
use crate::index::{ChartVersion, RepositoryIndex};
use crate::transport::HttpTransport;
use crate::versions;

/// HTTP repository client
pub struct HttpChartClient {
    /// Repository URL as given by the caller
    url: String,
    /// Repository base, always ending in `/` so relative chart URLs resolve below it
    base: Url,
    transport: HttpTransport,
    /// Index, loaded at most once
    index: OnceCell<RepositoryIndex>,
}

impl HttpChartClient {
    /// Create a client for the repository at `repo_url`
    pub fn new(repo_url: &str, options: &ClientOptions) -> Result<Self> {
        let base = repository_base(repo_url)?;
        let transport = HttpTransport::new(base.clone(), options)?;

        Ok(Self {
            url: repo_url.to_string(),
            base,
            transport,
            index: OnceCell::new(),
        })
    }

    /// Get the index URL
    pub fn index_url(&self) -> String {
        format!("{}index.yaml", self.base)
    }

    /// Get the index if it has been loaded already
    pub fn cached_index(&self) -> Option<&RepositoryIndex> {
        self.index.get()
    }

    /// Get the index, fetching it on first use
    pub async fn index(&self) -> Result<&RepositoryIndex> {
        self.index.get_or_try_init(|| self.load_index()).await
    }

    async fn load_index(&self) -> Result<RepositoryIndex> {
        let index_url = self.index_url();
        tracing::debug!("Fetching index {}", index_url);

        let fetch = async {
            let url = Url::parse(&index_url)?;
            let data = self.transport.get_bytes(&url).await?;
            RepositoryIndex::from_bytes(&data)
        };

        let index = fetch.await.map_err(|source| ChartError::IndexFetch {
            url: index_url.clone(),
            source,
        })?;

        tracing::debug!(
            "Loaded index {} with {} charts",
            index_url,
            index.entries.len()
        );
        Ok(index)
    }

    /// Get all version records of a chart
    pub async fn entries(&self, name: &str) -> Result<&[ChartVersion]> {
        let index = self.index().await?;
        index.get(name).ok_or_else(|| ChartError::ChartNotFound {
            name: name.to_string(),
        })
    }

    /// Resolve a chart URL from the index against the repository base
    pub fn resolve_chart_url(&self, url: &str) -> std::result::Result<Url, TransferError> {
        Ok(self.base.join(url)?)
    }

    /// List the versions of a chart, ascending
    pub async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let entries = self.entries(name).await?;
        versions::sort_chart_versions(entries)
    }

    /// Download a chart archive
    pub async fn get_chart(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        self.entries(name).await?;
        let entry = self
            .index()
            .await?
            .get_version(name, version)
            .ok_or_else(|| ChartError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })?;

        let raw_url = entry.download_url().ok_or_else(|| ChartError::NoDownloadUrl {
            name: name.to_string(),
            version: version.to_string(),
        })?;

        let chart_url = self
            .resolve_chart_url(raw_url)
            .map_err(|source| ChartError::Download {
                url: raw_url.to_string(),
                source,
            })?;

        tracing::debug!("Downloading chart {}-{} from {}", name, version, chart_url);
        let data = self
            .transport
            .get_bytes(&chart_url)
            .await
            .map_err(|source| ChartError::Download {
                url: chart_url.to_string(),
                source,
            })?;

        if let Some(expected) = &entry.digest {
            let actual = compute_digest(&data);
            if !digest_matches(expected, &actual) {
                return Err(ChartError::IntegrityCheckFailed {
                    name: format!("{}-{}", name, version),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(data)
    }
}

#[async_trait]
impl ChartClient for HttpChartClient {
    fn backend(&self) -> Backend {
        Backend::Http
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn get_chart(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        HttpChartClient::get_chart(self, name, version).await
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        HttpChartClient::list_versions(self, name).await
    }

    async fn login(&self) -> Result<()> {
        // Basic auth travels with each request
        Ok(())
    }
}

/// Parse a repository URL into a directory-like base
fn repository_base(repo_url: &str) -> Result<Url> {
    let trimmed = repo_url.trim_end_matches('/');
    let base = Url::parse(&format!("{}/", trimmed)).map_err(|e| ChartError::Build {
        message: format!("failed parsing repo URL '{}': {}", repo_url, e),
    })?;

    match base.scheme() {
        "http" | "https" => Ok(base),
        other => Err(ChartError::Build {
            message: format!(
                "repo URL '{}' must use http or https, not '{}'",
                repo_url, other
            ),
        }),
    }
}

/// Compute SHA256 digest of data
fn compute_digest(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Check if two digests match, ignoring case and `sha256:` prefixes
fn digest_matches(expected: &str, actual: &str) -> bool {
    let normalize = |d: &str| d.trim().to_lowercase().trim_start_matches("sha256:").to_string();
    normalize(expected) == normalize(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> HttpChartClient {
        HttpChartClient::new(url, &ClientOptions::default()).unwrap()
    }

    #[test]
    fn test_index_url() {
        assert_eq!(
            client("https://stefanprodan.github.io/podinfo").index_url(),
            "https://stefanprodan.github.io/podinfo/index.yaml"
        );
        assert_eq!(
            client("https://charts.example.com/").index_url(),
            "https://charts.example.com/index.yaml"
        );
    }

    #[test]
    fn test_resolve_relative_chart_url() {
        let c = client("https://example.com/charts");
        assert_eq!(
            c.resolve_chart_url("podinfo-1.0.0.tgz").unwrap().as_str(),
            "https://example.com/charts/podinfo-1.0.0.tgz"
        );
        assert_eq!(
            c.resolve_chart_url("/archive/podinfo-1.0.0.tgz")
                .unwrap()
                .as_str(),
            "https://example.com/archive/podinfo-1.0.0.tgz"
        );
        assert_eq!(
            c.resolve_chart_url("https://cdn.example.org/podinfo-1.0.0.tgz")
                .unwrap()
                .as_str(),
            "https://cdn.example.org/podinfo-1.0.0.tgz"
        );
    }

    #[test]
    fn test_malformed_repo_url() {
        let err = HttpChartClient::new("not a url", &ClientOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ChartError::Build { .. }));

        let err = HttpChartClient::new("ftp://example.com", &ClientOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ChartError::Build { .. }));
    }

    #[test]
    fn test_index_not_loaded_on_construction() {
        let c = client("https://example.com");
        assert!(c.cached_index().is_none());
        assert_eq!(c.backend(), Backend::Http);
    }

    #[test]
    fn test_compute_digest() {
        let digest = compute_digest(b"hello world");
        assert_eq!(
            digest,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_digest_matches() {
        assert!(digest_matches("sha256:abc123", "sha256:ABC123"));
        assert!(digest_matches("abc123", "sha256:abc123"));
        assert!(!digest_matches("sha256:abc123", "sha256:xyz789"));
    }
}
