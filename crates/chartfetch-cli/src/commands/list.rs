//! List command - print the available versions of a chart

use chartfetch_client::ChartClient;
use console::style;

use crate::error::{CliError, Result};

/// Run the list command
pub async fn run(client: &dyn ChartClient, chart: &str, output_json: bool) -> Result<()> {
    let versions = client.list_versions(chart).await?;

    if output_json {
        let json = serde_json::to_string_pretty(&versions).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", json);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions of {} found in {}", chart, client.url());
        return Ok(());
    }

    let latest = versions.len() - 1;
    for (i, version) in versions.iter().enumerate() {
        if i == latest {
            println!("{} {}", version, style("(latest)").green());
        } else {
            println!("{}", version);
        }
    }

    Ok(())
}
