//! HTTP transport with redirect protection
//!
//! Key properties:
//! - Basic credentials are only attached to URLs sharing the repository origin
//! - Redirects are followed manually so credentials never leak cross-origin
//! - Every body is checked against its declared `Content-Length`

use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::config::ClientOptions;
use crate::error::{ChartError, Result, TransferError};

const MAX_REDIRECTS: u32 = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for buffer preallocation from an untrusted `Content-Length`
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// HTTP client bound to one repository origin
pub struct HttpTransport {
    client: reqwest::Client,
    origin: Url,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    /// Create a transport for the repository at `origin`
    pub fn new(origin: Url, options: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            // Redirects are followed by hand in `get`
            .redirect(reqwest::redirect::Policy::none())
            // Bodies may take long on slow links; only connecting is bounded
            .connect_timeout(CONNECT_TIMEOUT)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify);

        if let Some(ca_file) = &options.ca_file {
            let pem = read_pem(ca_file)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| ChartError::Build {
                message: format!("invalid CA certificate {}: {}", ca_file.display(), e),
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some((cert_file, key_file)) = options.client_identity() {
            let mut pem = read_pem(cert_file)?;
            pem.push(b'\n');
            pem.extend_from_slice(&read_pem(key_file)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| ChartError::Build {
                message: format!(
                    "invalid client certificate {} / key {}: {}",
                    cert_file.display(),
                    key_file.display(),
                    e
                ),
            })?;
            builder = builder.identity(identity);
        } else if options.cert_file.is_some() || options.key_file.is_some() {
            return Err(ChartError::Build {
                message: "client certificate and key must be provided together".to_string(),
            });
        }

        let client = builder.build().map_err(|e| ChartError::Build {
            message: e.to_string(),
        })?;

        let credentials = options
            .basic_auth()
            .map(|(u, p)| (u.to_string(), p.to_string()));

        Ok(Self {
            client,
            origin,
            credentials,
        })
    }

    /// Fetch a URL into memory
    ///
    /// Fails on non-success status, and when fewer or more bytes arrive than
    /// the server declared.
    pub async fn get_bytes(&self, url: &Url) -> std::result::Result<Vec<u8>, TransferError> {
        let mut response = self.get(url).await?;

        let expected = response.content_length();
        let capacity = expected.unwrap_or(0).min(MAX_PREALLOC) as usize;
        let mut body = Vec::with_capacity(capacity);
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
        }

        if let Some(expected) = expected {
            let received = body.len() as u64;
            if received != expected {
                return Err(TransferError::Truncated { received, expected });
            }
        }

        Ok(body)
    }

    async fn get(&self, url: &Url) -> std::result::Result<reqwest::Response, TransferError> {
        let mut current = url.clone();
        let mut redirects = 0;

        loop {
            let mut request = self.client.get(current.clone());

            if same_origin(&self.origin, &current) {
                if let Some((username, password)) = &self.credentials {
                    request = request.basic_auth(username, Some(password));
                }
            } else if self.credentials.is_some() {
                tracing::warn!(
                    "Request to {} leaves repository origin {} - credentials not forwarded",
                    current,
                    self.origin
                );
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(TransferError::TooManyRedirects { max: MAX_REDIRECTS });
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(TransferError::MissingLocation)?;

                current = current.join(location)?;
                tracing::debug!("Following redirect to {}", current);
                continue;
            }

            if !status.is_success() {
                return Err(TransferError::Status {
                    status: status.as_u16(),
                });
            }

            return Ok(response);
        }
    }
}

/// Check if two URLs are same-origin
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host() == b.host()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Read PEM material for TLS configuration
pub(crate) fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ChartError::Build {
        message: format!("failed reading {}: {}", path.display(), e),
    })
}
