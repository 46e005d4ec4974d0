//! Semantic version ordering for chart versions
//!
//! Both backends hand back raw version labels (index records or registry
//! tags). They are ordered here by semver precedence; the literals
//! themselves are returned untouched so that the last one can be passed
//! straight back to `get_chart`.

use semver::Version;
use std::cmp::Ordering;

use crate::error::{ChartError, Result};
use crate::index::ChartVersion;

/// Parse a version label as a semantic version
///
/// A single leading `v` is accepted (`v1.2.3`).
pub fn parse_version(literal: &str) -> Result<Version> {
    let trimmed = literal.strip_prefix('v').unwrap_or(literal);
    Version::parse(trimmed).map_err(|e| ChartError::InvalidVersion {
        version: literal.to_string(),
        message: e.to_string(),
    })
}

/// Compare two versions by semver precedence
///
/// Build metadata does not take part in the ordering.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Sort version labels ascending
///
/// Fails on the first label that is not a semantic version; nothing is
/// returned in that case.
pub fn sort_versions<I, S>(versions: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = versions
        .into_iter()
        .map(|v| {
            let literal = v.into();
            parse_version(&literal).map(|version| (version, literal))
        })
        .collect::<Result<Vec<_>>>()?;

    parsed.sort_by(|(a, _), (b, _)| precedence(a, b));

    Ok(parsed.into_iter().map(|(_, literal)| literal).collect())
}

/// Sort the version records of one chart ascending
pub fn sort_chart_versions(entries: &[ChartVersion]) -> Result<Vec<String>> {
    sort_versions(entries.iter().map(|e| e.version.as_str()))
}

/// The latest version of an ascending list
pub fn latest_version(sorted: &[String]) -> Option<&str> {
    sorted.last().map(|s| s.as_str())
}
