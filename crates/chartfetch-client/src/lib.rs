//! Chartfetch client
//!
//! Fetch charts and list their versions from two kinds of stores behind
//! one interface:
//!
//! - **HTTP repositories**: Helm-style repos publishing an `index.yaml`
//! - **OCI registries**: charts stored as tagged artifacts (GHCR, Docker Hub, ECR, ...)
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartfetch_client::{ClientOptions, connect, latest_version};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Backend is picked from the URL scheme
//! let client = connect("oci://ghcr.io/stefanprodan/charts", ClientOptions::default()).await?;
//!
//! let versions = client.list_versions("podinfo").await?;
//! if let Some(latest) = latest_version(&versions) {
//!     let archive = client.get_chart("podinfo", latest).await?;
//!     std::fs::write(format!("podinfo-{}.tar.gz", latest), archive)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Basic credentials are never sent outside the repository origin
//! - Chart archives are checked against the index digest when one is published

pub mod error;
pub mod config;
pub mod versions;
pub mod index;
pub mod transport;
pub mod http;
pub mod oci;
pub mod builder;
pub mod client;

// Re-exports for convenience
pub use error::{ChartError, Result, TransferError};
pub use config::ClientOptions;
pub use versions::{latest_version, parse_version, sort_chart_versions, sort_versions};
pub use index::{ChartVersion, RepositoryIndex};
pub use http::HttpChartClient;
pub use oci::OciChartClient;
pub use builder::{HttpClientBuilder, OciClientBuilder};
pub use client::{Backend, ChartClient, connect};
