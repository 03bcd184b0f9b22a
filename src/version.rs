// ABOUTME: Version resolution for promotions without an explicit version.
// ABOUTME: Picks the greatest semantic version published for a chart.

use tracing::warn;

use crate::chart::ChartClient;
use crate::error::{Error, Result};

/// Resolves which version to promote when the caller gave none.
pub struct VersionResolver<'a> {
    chart: &'a dyn ChartClient,
}

impl<'a> VersionResolver<'a> {
    pub fn new(chart: &'a dyn ChartClient) -> Self {
        Self { chart }
    }

    /// The latest published version of `app`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoVersions`] when the repository lists no versions
    /// for the chart at all.
    pub async fn latest(&self, app: &str) -> Result<String> {
        let versions = self.chart.search_versions(app).await?;
        select_latest(&versions).ok_or_else(|| Error::NoVersions(app.to_string()))
    }
}

/// Pick the greatest parseable semantic version; when nothing parses, fall
/// back to the lexicographically greatest raw string.
fn select_latest(versions: &[String]) -> Option<String> {
    let mut max_semver: Option<semver::Version> = None;
    let mut max_raw: Option<&str> = None;

    for version in versions {
        match semver::Version::parse(version) {
            Ok(parsed) => {
                if max_semver.as_ref().is_none_or(|max| parsed > *max) {
                    max_semver = Some(parsed);
                }
            }
            Err(err) => {
                warn!(version = %version, "invalid semantic version: {err}");
                if max_raw.is_none_or(|max| version.as_str() > max) {
                    max_raw = Some(version);
                }
            }
        }
    }

    max_semver
        .map(|v| v.to_string())
        .or_else(|| max_raw.map(String::from))
}
