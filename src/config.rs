// ABOUTME: Immutable promotion configuration built once from the CLI.
// ABOUTME: Also discovers the application name from chart metadata or the git remote.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::gitinfo::GitInfo;

pub const DEFAULT_HELM_REPO_NAME: &str = "releases";
pub const DEFAULT_HELM_REPO_URL: &str = "http://chartmuseum:8080";

/// Everything a promotion run needs to know, constructed once and passed by
/// reference. There is no mutable option state.
#[derive(Debug, Clone)]
pub struct PromoteConfig {
    /// The application (chart) being promoted.
    pub app: String,

    /// The version to promote; empty means "latest".
    pub version: String,

    /// Target environment name, when promoting to a named environment.
    pub environment: Option<String>,

    /// Target namespace override.
    pub namespace: Option<String>,

    /// Explicit release name; defaults to `{namespace}-{app}`.
    pub release_name: Option<String>,

    /// Local repository alias that carries the app's chart.
    pub helm_repo_name: String,

    /// URL of the chart repository.
    pub helm_repo_url: String,

    /// Promote to every automatic environment in order.
    pub all_automatic: bool,

    /// How long to wait for the promotion to land.
    pub timeout: Duration,

    /// Wait between pull request poll iterations.
    pub poll_interval: Duration,

    /// Skip the repository index refresh before upgrading.
    pub no_helm_update: bool,

    /// Never merge promotion pull requests automatically.
    pub no_merge: bool,

    /// Non-interactive mode: never prompt, decline confirmations.
    pub batch: bool,

    /// Git metadata of the promoted repository, when discoverable.
    pub git_info: Option<GitInfo>,
}

impl PromoteConfig {
    /// The release name for a promotion into `namespace`.
    pub fn release_name(&self, namespace: &str) -> String {
        self.release_name
            .clone()
            .unwrap_or_else(|| format!("{namespace}-{}", self.app))
    }

    /// The repo-qualified chart reference, e.g. `releases/myapp`.
    pub fn full_app_name(&self) -> String {
        if self.helm_repo_name.is_empty() {
            self.app.clone()
        } else {
            format!("{}/{}", self.helm_repo_name, self.app)
        }
    }

    /// A baseline configuration for tests.
    pub fn template() -> Self {
        Self {
            app: "my-app".to_string(),
            version: String::new(),
            environment: None,
            namespace: None,
            release_name: None,
            helm_repo_name: DEFAULT_HELM_REPO_NAME.to_string(),
            helm_repo_url: DEFAULT_HELM_REPO_URL.to_string(),
            all_automatic: false,
            timeout: Duration::from_secs(60 * 60),
            poll_interval: Duration::from_secs(20),
            no_helm_update: false,
            no_merge: false,
            batch: true,
            git_info: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    name: String,
}

/// Discover the application name when none was given: the chart in the
/// working directory first, then the git remote repository name.
pub async fn discover_app_name(dir: &Path) -> Result<String> {
    if let Some(name) = chart_name(dir) {
        return Ok(name);
    }
    if let Some(git) = crate::gitinfo::discover(dir).await {
        return Ok(git.name);
    }
    Err(Error::AppDiscovery(
        "no Chart.yaml and no git remote found".to_string(),
    ))
}

/// The chart name from `Chart.yaml`, either at the top level or one
/// directory below (the conventional `charts/<app>/` layout).
fn chart_name(dir: &Path) -> Option<String> {
    let mut candidates = vec![dir.join("Chart.yaml")];
    for base in [dir.to_path_buf(), dir.join("charts")] {
        if let Ok(entries) = std::fs::read_dir(&base) {
            for entry in entries.flatten() {
                candidates.push(entry.path().join("Chart.yaml"));
            }
        }
    }

    for candidate in candidates {
        if let Ok(content) = std::fs::read_to_string(&candidate) {
            if let Ok(meta) = serde_yaml::from_str::<ChartMeta>(&content) {
                return Some(meta.name);
            }
        }
    }
    None
}
