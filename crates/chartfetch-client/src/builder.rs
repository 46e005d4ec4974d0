//! Client builders
//!
//! Each backend has a builder accumulating [`ClientOptions`] before a
//! single terminal `build()`. Options are not checked against each other;
//! a caller may set client certificates and Basic credentials together.
//!
//! ```rust,no_run
//! use chartfetch_client::HttpClientBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClientBuilder::new("https://stefanprodan.github.io/podinfo")
//!     .with_basic_auth("user", "secret")
//!     .build()?;
//!
//! let versions = client.list_versions("podinfo").await?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::http::HttpChartClient;
use crate::oci::OciChartClient;

/// Builder for [`HttpChartClient`]
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    repo_url: String,
    options: ClientOptions,
}

impl HttpClientBuilder {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            options: ClientOptions::default(),
        }
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Authenticate with a client certificate, key and CA bundle
    pub fn with_client_certs(
        mut self,
        cert_file: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
        ca_file: impl Into<PathBuf>,
    ) -> Self {
        set_client_certs(&mut self.options, cert_file, key_file, ca_file);
        self
    }

    pub fn with_insecure_skip_tls_verify(mut self, insecure_skip_tls_verify: bool) -> Self {
        self.options.insecure_skip_tls_verify = insecure_skip_tls_verify;
        self
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.options.username = Some(username.into());
        self.options.password = Some(password.into());
        self
    }

    /// Options accumulated so far
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Build the client
    ///
    /// No request is made; the index is fetched on first use.
    pub fn build(self) -> Result<HttpChartClient> {
        HttpChartClient::new(&self.repo_url, &self.options)
    }
}

/// Builder for [`OciChartClient`]
#[derive(Debug, Clone)]
pub struct OciClientBuilder {
    registry_url: String,
    options: ClientOptions,
}

impl OciClientBuilder {
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: registry_url.into(),
            options: ClientOptions::default(),
        }
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Authenticate with a client certificate, key and CA bundle
    ///
    /// Registries only honor the CA bundle; `build()` rejects a certificate
    /// and key.
    pub fn with_client_certs(
        mut self,
        cert_file: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
        ca_file: impl Into<PathBuf>,
    ) -> Self {
        set_client_certs(&mut self.options, cert_file, key_file, ca_file);
        self
    }

    pub fn with_insecure_skip_tls_verify(mut self, insecure_skip_tls_verify: bool) -> Self {
        self.options.insecure_skip_tls_verify = insecure_skip_tls_verify;
        self
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.options.username = Some(username.into());
        self.options.password = Some(password.into());
        self
    }

    /// Talk plain HTTP to the registry
    pub fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.options.plain_http = plain_http;
        self
    }

    /// Options accumulated so far
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Build the client, logging in if Basic credentials were set
    pub async fn build(self) -> Result<OciChartClient> {
        OciChartClient::connect(&self.registry_url, &self.options).await
    }
}

fn set_client_certs(
    options: &mut ClientOptions,
    cert_file: impl Into<PathBuf>,
    key_file: impl Into<PathBuf>,
    ca_file: impl Into<PathBuf>,
) {
    options.cert_file = Some(cert_file.into());
    options.key_file = Some(key_file.into());
    options.ca_file = Some(ca_file.into());
}
