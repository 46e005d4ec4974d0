//! Shared utility functions for CLI commands

/// Format a byte size as a human-readable string
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// File name a fetched chart archive is saved under
///
/// Slashes in nested OCI chart names are flattened so the archive lands
/// directly in the output directory.
#[must_use]
pub fn archive_file_name(chart: &str, version: &str) -> String {
    let base = chart.rsplit('/').next().unwrap_or(chart);
    format!("{}-{}.tar.gz", base, version)
}
