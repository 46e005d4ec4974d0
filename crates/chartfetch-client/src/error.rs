//! Error types for chart client operations

use thiserror::Error;

/// Chart client errors
#[derive(Debug, Error)]
pub enum ChartError {
    // ============ Construction Errors ============
    #[error("Failed to build chart client: {message}")]
    Build { message: String },

    #[error("Unsupported URL scheme '{scheme}'. Only 'oci', 'https' and 'http' are supported")]
    UnsupportedScheme { scheme: String },

    #[error("Invalid client configuration: {message}")]
    Config { message: String },

    // ============ Authentication Errors ============
    #[error("Failed to log into registry {registry}: {message}")]
    Auth { registry: String, message: String },

    // ============ Transport Errors ============
    #[error("Failed to load index file from {url}: {source}")]
    IndexFetch {
        url: String,
        #[source]
        source: TransferError,
    },

    #[error("Failed to download chart from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: TransferError,
    },

    #[error("OCI registry error for {reference}: {message}")]
    Registry { reference: String, message: String },

    // ============ Lookup Errors ============
    #[error("No version of chart {name} found")]
    ChartNotFound { name: String },

    #[error("Chart {name}, version {version} not found")]
    VersionNotFound { name: String, version: String },

    #[error("Index file contains no URL for chart {name}, version {version}")]
    NoDownloadUrl { name: String, version: String },

    // ============ Content Errors ============
    #[error("Pull of {reference} resulted in empty chart data")]
    EmptyArtifact { reference: String },

    #[error("Integrity check failed for {name}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Failed parsing semantic chart version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChartError {
    /// Whether the chart or the requested version is absent from the store
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ChartError::ChartNotFound { .. }
                | ChartError::VersionNotFound { .. }
                | ChartError::NoDownloadUrl { .. }
        )
    }

    /// Whether the failure happened while talking to the remote store
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChartError::IndexFetch { .. }
                | ChartError::Download { .. }
                | ChartError::Registry { .. }
                | ChartError::Auth { .. }
        )
    }
}

/// Failures of a single HTTP transfer
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("{received} bytes received, {expected} expected")]
    Truncated { received: u64, expected: u64 },

    #[error("too many redirects (max {max})")]
    TooManyRedirects { max: u32 },

    #[error("redirect without Location header")]
    MissingLocation,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("malformed index file: {0}")]
    Decode(String),
}

/// Result type for chart client operations
pub type Result<T> = std::result::Result<T, ChartError>;

impl From<serde_yaml::Error> for ChartError {
    fn from(e: serde_yaml::Error) -> Self {
        ChartError::Config {
            message: e.to_string(),
        }
    }
}
