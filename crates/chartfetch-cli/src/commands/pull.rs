//! Pull command - download a chart archive

use std::path::Path;

use chartfetch_client::{ChartClient, latest_version};
use console::style;

use crate::error::{CliError, Result};
use crate::util::{archive_file_name, format_size};

/// Download `chart` into `output_dir`
///
/// Without an explicit version the highest one is fetched.
pub async fn run(
    client: &dyn ChartClient,
    chart: &str,
    version: Option<&str>,
    output_dir: &Path,
) -> Result<()> {
    let version = match version {
        Some(v) => v.to_string(),
        None => {
            let versions = client.list_versions(chart).await?;
            latest_version(&versions)
                .map(str::to_string)
                .ok_or_else(|| {
                    CliError::not_found_with_help(
                        format!("No version of chart {} found", chart),
                        format!("Check the chart name against {}", client.url()),
                    )
                })?
        }
    };

    println!(
        "Pulling {}:{} from {} ({})...",
        style(chart).cyan(),
        version,
        client.url(),
        client.backend()
    );

    let data = client.get_chart(chart, &version).await?;

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(archive_file_name(chart, &version));
    std::fs::write(&output_path, &data)?;

    println!(
        "{} Saved to {} ({})",
        style("✓").green().bold(),
        output_path.display(),
        format_size(data.len() as u64)
    );

    Ok(())
}
