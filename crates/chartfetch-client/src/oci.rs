//! OCI registry client
//!
//! Tag listing and pull for charts stored in OCI-compliant registries.

use std::collections::HashSet;

use async_trait::async_trait;
use oci_distribution::client::{
    Certificate, CertificateEncoding, Client, ClientConfig, ClientProtocol, ImageLayer,
};
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Reference, RegistryOperation};
use url::Url;

use crate::client::{Backend, ChartClient};
use crate::config::ClientOptions;
use crate::error::{ChartError, Result, TransferError};
use crate::transport::{HttpTransport, read_pem};
use crate::versions;

/// Media types for Helm charts in OCI
pub mod media_types {
    /// Helm chart config
    pub const HELM_CONFIG: &str = "application/vnd.cncf.helm.config.v1+json";
    /// Helm chart content layer
    pub const HELM_CONTENT: &str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";
    /// Helm chart provenance layer
    pub const HELM_PROVENANCE: &str = "application/vnd.cncf.helm.chart.provenance.v1.prov";
}

/// Page size requested from the tag listing endpoint
const TAGS_PAGE_SIZE: usize = 1000;

/// OCI registry client
pub struct OciChartClient {
    /// Registry URL as given by the caller
    url: String,
    /// Registry host and base path, e.g. `ghcr.io/stefanprodan/charts`
    registry: String,
    client: Client,
    auth: RegistryAuth,
}

impl OciChartClient {
    /// Create a client for the registry at `registry_url`
    ///
    /// Logs into the registry right away when Basic credentials are set.
    pub async fn connect(registry_url: &str, options: &ClientOptions) -> Result<Self> {
        let registry = normalize_registry(registry_url)?;

        if options.cert_file.is_some() || options.key_file.is_some() {
            return Err(ChartError::Build {
                message: "client certificate authentication is not supported for OCI registries"
                    .to_string(),
            });
        }

        let mut config = ClientConfig {
            protocol: if options.plain_http {
                ClientProtocol::Http
            } else {
                ClientProtocol::Https
            },
            accept_invalid_certificates: options.insecure_skip_tls_verify,
            ..Default::default()
        };
        if let Some(ca_file) = &options.ca_file {
            config.extra_root_certificates.push(Certificate {
                encoding: CertificateEncoding::Pem,
                data: read_pem(ca_file)?,
            });
        }

        let auth = match options.basic_auth() {
            Some((username, password)) => {
                RegistryAuth::Basic(username.to_string(), password.to_string())
            }
            None => RegistryAuth::Anonymous,
        };

        let client = Self {
            url: registry_url.to_string(),
            registry,
            client: Client::new(config),
            auth,
        };

        if matches!(client.auth, RegistryAuth::Basic(..)) {
            client.authenticate(options).await?;
        }

        Ok(client)
    }

    /// Get the registry host and base path
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Registry host, e.g. `ghcr.io`
    fn host(&self) -> &str {
        self.registry
            .split_once('/')
            .map_or(self.registry.as_str(), |(host, _)| host)
    }

    async fn authenticate(&self, options: &ClientOptions) -> Result<()> {
        let reference = self.login_reference();
        tracing::debug!("Logging into registry {}", self.registry);

        let token = self
            .client
            .auth(&reference, &self.auth, RegistryOperation::Pull)
            .await
            .map_err(|e| self.auth_error(e.to_string()))?;

        // No bearer exchange took place, so nothing has checked the credentials yet
        if token.is_none() {
            self.check_basic_credentials(options).await?;
        }

        Ok(())
    }

    /// Send the Basic credentials to the registry's version endpoint
    async fn check_basic_credentials(&self, options: &ClientOptions) -> Result<()> {
        let scheme = if options.plain_http { "http" } else { "https" };
        let url = Url::parse(&format!("{}://{}/v2/", scheme, self.host())).map_err(|e| {
            ChartError::Build {
                message: format!("invalid registry URL '{}': {}", self.url, e),
            }
        })?;
        tracing::debug!("Checking credentials against {}", url);

        let transport = HttpTransport::new(url.clone(), options)?;
        transport.get_bytes(&url).await.map_err(|e| match e {
            TransferError::Status { status: 401 | 403 } => {
                self.auth_error("invalid username or password".to_string())
            }
            other => self.auth_error(other.to_string()),
        })?;

        Ok(())
    }

    fn auth_error(&self, message: String) -> ChartError {
        ChartError::Auth {
            registry: self.registry.clone(),
            message,
        }
    }

    /// Reference used to obtain credentials for the registry
    fn login_reference(&self) -> Reference {
        let path = self.registry.split_once('/').map_or("", |(_, path)| path);
        // Token servers validate credentials whatever the scope
        let repository = if path.is_empty() { "library" } else { path };
        Reference::with_tag(
            self.host().to_string(),
            repository.to_string(),
            "latest".to_string(),
        )
    }

    /// Build a reference string from chart name and tag
    pub fn reference_string(&self, name: &str, tag: &str) -> String {
        format!("{}/{}:{}", self.registry, name, tag)
    }

    /// Build an OCI reference from chart name and tag
    pub fn build_reference(&self, name: &str, tag: &str) -> Result<Reference> {
        let full_ref = self.reference_string(name, tag);
        Reference::try_from(full_ref.as_str()).map_err(|e| ChartError::Registry {
            reference: full_ref.clone(),
            message: format!("invalid reference: {}", e),
        })
    }

    /// List all tags of a chart
    pub async fn list_tags(&self, name: &str) -> Result<Vec<String>> {
        let reference = self.build_reference(name, "latest")?;
        let repository = format!("{}/{}", self.registry, name);
        tracing::debug!("Listing tags of {}", repository);

        let mut tags: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let last = tags.last().map(|t| t.as_str());
            let page = self
                .client
                .list_tags(&reference, &self.auth, Some(TAGS_PAGE_SIZE), last)
                .await
                .map_err(|e| ChartError::Registry {
                    reference: repository.clone(),
                    message: format!("failed getting tags: {}", e),
                })?;

            let count = page.tags.len();
            let added = append_new_tags(&mut tags, &mut seen, page.tags);

            // Registries that ignore `n` return everything at once
            if count < TAGS_PAGE_SIZE || added == 0 {
                break;
            }
        }

        Ok(tags)
    }

    /// Pull the chart archive of a tagged artifact
    pub async fn pull(&self, name: &str, tag: &str) -> Result<Vec<u8>> {
        let reference = self.build_reference(name, tag)?;
        let full_ref = reference.whole();
        tracing::debug!("Pulling {}", full_ref);

        let image_data = self
            .client
            .pull(
                &reference,
                &self.auth,
                vec![
                    media_types::HELM_CONFIG,
                    media_types::HELM_CONTENT,
                    media_types::HELM_PROVENANCE,
                ],
            )
            .await
            .map_err(|e| ChartError::Registry {
                reference: full_ref.clone(),
                message: format!("failed pulling chart: {}", e),
            })?;

        chart_content(image_data.layers, full_ref)
    }
}

/// Append the tags not seen before, keeping listing order
fn append_new_tags(
    tags: &mut Vec<String>,
    seen: &mut HashSet<String>,
    page: Vec<String>,
) -> usize {
    let before = tags.len();
    for tag in page {
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags.len() - before
}

/// Extract the chart archive from pulled layers
fn chart_content(layers: Vec<ImageLayer>, reference: String) -> Result<Vec<u8>> {
    layers
        .into_iter()
        .find(|l| l.media_type == media_types::HELM_CONTENT)
        .map(|l| l.data)
        .filter(|data| !data.is_empty())
        .ok_or(ChartError::EmptyArtifact { reference })
}

#[async_trait]
impl ChartClient for OciChartClient {
    fn backend(&self) -> Backend {
        Backend::Oci
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn get_chart(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        self.pull(name, version).await
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let tags = self.list_tags(name).await?;
        versions::sort_versions(tags)
    }

    async fn login(&self) -> Result<()> {
        // Already logged in while connecting
        Ok(())
    }
}

/// Strip the scheme and trailing slashes from a registry URL
fn normalize_registry(registry_url: &str) -> Result<String> {
    let registry = registry_url
        .trim_start_matches("oci://")
        .trim_end_matches('/');

    if registry.is_empty() || registry.contains("://") || registry.contains(char::is_whitespace) {
        return Err(ChartError::Build {
            message: format!("invalid registry URL '{}'", registry_url),
        });
    }

    Ok(registry.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn anonymous_client() -> OciChartClient {
        OciChartClient::connect(
            "oci://ghcr.io/stefanprodan/charts",
            &ClientOptions::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_normalize_registry() {
        assert_eq!(
            normalize_registry("oci://ghcr.io/stefanprodan/charts/").unwrap(),
            "ghcr.io/stefanprodan/charts"
        );
        assert_eq!(
            normalize_registry("ghcr.io/stefanprodan/charts").unwrap(),
            "ghcr.io/stefanprodan/charts"
        );
        assert!(normalize_registry("oci://").is_err());
        assert!(normalize_registry("https://ghcr.io/charts").is_err());
        assert!(normalize_registry("oci://ghcr.io/my charts").is_err());
    }

    #[tokio::test]
    async fn test_anonymous_connect_is_offline() {
        let client = anonymous_client().await;
        assert_eq!(client.registry(), "ghcr.io/stefanprodan/charts");
        assert_eq!(client.backend(), Backend::Oci);
        client.login().await.unwrap();
    }

    #[tokio::test]
    async fn test_build_reference() {
        let client = anonymous_client().await;

        assert_eq!(
            client.reference_string("podinfo", "6.5.4"),
            "ghcr.io/stefanprodan/charts/podinfo:6.5.4"
        );

        let reference = client.build_reference("podinfo", "6.5.4").unwrap();
        assert_eq!(reference.registry(), "ghcr.io");
        assert_eq!(reference.repository(), "stefanprodan/charts/podinfo");
        assert_eq!(reference.tag(), Some("6.5.4"));

        assert_eq!(client.host(), "ghcr.io");
        let login = client.login_reference();
        assert_eq!(login.registry(), "ghcr.io");
        assert_eq!(login.repository(), "stefanprodan/charts");
    }

    #[tokio::test]
    async fn test_invalid_tag_reference() {
        let client = anonymous_client().await;
        let err = client.build_reference("podinfo", "bad tag!").err().unwrap();
        assert!(matches!(err, ChartError::Registry { .. }));
    }

    #[tokio::test]
    async fn test_client_certs_rejected() {
        let options = ClientOptions {
            cert_file: Some("client.crt".into()),
            key_file: Some("client.key".into()),
            ..Default::default()
        };
        let err = OciChartClient::connect("oci://ghcr.io/stefanprodan/charts", &options)
            .await
            .err()
            .unwrap();
        match err {
            ChartError::Build { message } => assert!(message.contains("not supported")),
            other => panic!("Expected Build error, got {:?}", other),
        }
    }

    #[test]
    fn test_append_new_tags() {
        let mut tags = Vec::new();
        let mut seen = HashSet::new();

        let page = vec!["1.0.0".to_string(), "1.1.0".to_string(), "1.0.0".to_string()];
        assert_eq!(append_new_tags(&mut tags, &mut seen, page), 2);

        // A registry repeating its last page adds nothing
        let page = vec!["1.1.0".to_string(), "1.0.0".to_string()];
        assert_eq!(append_new_tags(&mut tags, &mut seen, page), 0);

        let page = vec!["1.1.0".to_string(), "2.0.0".to_string()];
        assert_eq!(append_new_tags(&mut tags, &mut seen, page), 1);
        assert_eq!(tags, vec!["1.0.0", "1.1.0", "2.0.0"]);
    }

    fn layer(media_type: &str, data: &[u8]) -> ImageLayer {
        ImageLayer {
            data: data.to_vec(),
            media_type: media_type.to_string(),
            annotations: None,
        }
    }

    #[test]
    fn test_chart_content_layer() {
        let layers = vec![
            layer(media_types::HELM_PROVENANCE, b"signature"),
            layer(media_types::HELM_CONTENT, b"chart-bytes"),
        ];
        let data = chart_content(layers, "ghcr.io/org/podinfo:1.0.0".to_string()).unwrap();
        assert_eq!(data, b"chart-bytes");
    }

    #[test]
    fn test_chart_content_empty() {
        let reference = "ghcr.io/org/podinfo:1.0.0".to_string();

        let err = chart_content(vec![], reference.clone()).unwrap_err();
        assert!(matches!(err, ChartError::EmptyArtifact { .. }));

        let err = chart_content(vec![layer(media_types::HELM_CONTENT, b"")], reference.clone())
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptyArtifact { .. }));

        let err = chart_content(vec![layer(media_types::HELM_PROVENANCE, b"sig")], reference)
            .unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Pull of ghcr.io/org/podinfo:1.0.0 resulted in empty chart data"
        );
    }
}
