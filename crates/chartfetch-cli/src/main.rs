//! Chartfetch CLI - Fetch charts from HTTP repositories and OCI registries

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod util;

use chartfetch_client::ClientOptions;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "chartfetch")]
#[command(author = "Chartfetch Contributors")]
#[command(version)]
#[command(about = "Fetch charts from HTTP repositories and OCI registries", long_about = None)]
struct Cli {
    /// Repository URL (https://, http:// or oci://)
    repo_url: String,

    /// Chart name
    chart_name: String,

    /// Chart version to fetch (default: latest)
    #[arg(long)]
    chart_version: Option<String>,

    /// List available versions instead of downloading
    #[arg(long)]
    list: bool,

    /// Print the version list as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Directory the chart archive is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Username for Basic authentication
    #[arg(long, env = "CHARTFETCH_USERNAME")]
    username: Option<String>,

    /// Password for Basic authentication
    #[arg(long, env = "CHARTFETCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Client certificate file (PEM)
    #[arg(long)]
    cert_file: Option<PathBuf>,

    /// Client private key file (PEM)
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// CA bundle file (PEM)
    #[arg(long)]
    ca_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure_skip_tls_verify: bool,

    /// Use plain HTTP for OCI registries
    #[arg(long)]
    plain_http: bool,

    /// Client configuration file (default: <config dir>/chartfetch/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Log to stderr, filtered by `RUST_LOG`
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let options = client_options(&cli)?;
    tracing::debug!("Connecting to {}", cli.repo_url);
    let client = chartfetch_client::connect(&cli.repo_url, options).await?;

    if cli.list {
        commands::list::run(client.as_ref(), &cli.chart_name, cli.json).await
    } else {
        commands::pull::run(
            client.as_ref(),
            &cli.chart_name,
            cli.chart_version.as_deref(),
            &cli.output_dir,
        )
        .await
    }
}

/// Options from the configuration file, overridden by command-line flags
fn client_options(cli: &Cli) -> Result<ClientOptions> {
    let file_options = match &cli.config {
        Some(path) => ClientOptions::load_from(path)?,
        None => ClientOptions::load()?,
    };

    let flag_options = ClientOptions {
        cert_file: cli.cert_file.clone(),
        key_file: cli.key_file.clone(),
        ca_file: cli.ca_file.clone(),
        insecure_skip_tls_verify: cli.insecure_skip_tls_verify,
        username: cli.username.clone(),
        password: cli.password.clone(),
        plain_http: cli.plain_http,
    };

    let options = file_options.merge(flag_options);
    if options.cert_file.is_some() != options.key_file.is_some() {
        return Err(CliError::usage_with_help(
            "A client certificate needs its private key",
            "Pass both --cert-file and --key-file",
        ));
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "username: file-user\npassword: file-pass\nplainHttp: true\n")
            .unwrap();

        let cli = Cli::try_parse_from([
            "chartfetch",
            "oci://localhost:5000/charts",
            "podinfo",
            "--config",
            config.to_str().unwrap(),
            "--username",
            "flag-user",
        ])
        .unwrap();

        let options = client_options(&cli).unwrap();
        assert_eq!(options.basic_auth(), Some(("flag-user", "file-pass")));
        assert!(options.plain_http);
    }

    #[test]
    fn test_cert_without_key_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "{}\n").unwrap();

        let cli = Cli::try_parse_from([
            "chartfetch",
            "https://example.com/charts",
            "podinfo",
            "--config",
            config.to_str().unwrap(),
            "--cert-file",
            "client.crt",
        ])
        .unwrap();

        let err = client_options(&cli).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }

    #[test]
    fn test_json_requires_list() {
        assert!(
            Cli::try_parse_from(["chartfetch", "https://example.com", "podinfo", "--json"])
                .is_err()
        );
    }
}
