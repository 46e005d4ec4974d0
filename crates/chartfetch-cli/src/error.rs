//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartfetch_client::ChartError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid arguments, URL or client configuration
    #[error("{message}")]
    #[diagnostic(code(chartfetch::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart or version absent
    #[error("{message}")]
    #[diagnostic(code(chartfetch::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository or registry failure
    #[error("{message}")]
    #[diagnostic(code(chartfetch::cli::network))]
    Network {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartfetch::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(chartfetch::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Network { .. } => exit_codes::NETWORK_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a not-found error with help text
    pub fn not_found_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::io(err)
    }
}

impl From<ChartError> for CliError {
    fn from(err: ChartError) -> Self {
        let message = error_chain(&err);

        match &err {
            ChartError::Build { .. } | ChartError::Config { .. } => CliError::Usage {
                message,
                help: Some("Check the TLS files and the configuration file".to_string()),
            },
            ChartError::UnsupportedScheme { .. } => CliError::Usage {
                message,
                help: Some(
                    "Use an https:// or http:// repository URL, or an oci:// registry URL"
                        .to_string(),
                ),
            },
            e if e.is_not_found() => CliError::NotFound {
                message,
                help: Some("List the available versions with --list".to_string()),
            },
            ChartError::Auth { .. } => CliError::Network {
                message,
                help: Some("Check --username and --password".to_string()),
            },
            e if e.is_transport() => CliError::Network {
                message,
                help: None,
            },
            ChartError::EmptyArtifact { .. } | ChartError::IntegrityCheckFailed { .. } => {
                CliError::Network {
                    message,
                    help: None,
                }
            }
            ChartError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            _ => CliError::Other { message },
        }
    }
}

/// Join an error with its sources
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
