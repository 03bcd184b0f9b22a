// ABOUTME: Chart repository client seam: search, index refresh and release upgrades.
// ABOUTME: Exports the trait, the helm CLI implementation and the requirements manifest model.

mod helm;
mod requirements;

pub use helm::HelmCli;
pub use requirements::{Dependency, REQUIREMENTS_FILE, Requirements};

use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[error("helm {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("failed to parse helm output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid requirements manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Client for the chart repository and release lifecycle.
#[async_trait]
pub trait ChartClient: Send + Sync {
    /// Register the repository alias if it is not configured yet.
    /// First-run initialization happens here.
    async fn ensure_repo(&self, alias: &str, url: &str) -> Result<(), ChartError>;

    /// Refresh the local repository index.
    async fn update_repos(&self) -> Result<(), ChartError>;

    /// All published version strings for a chart, newest first as reported
    /// by the repository.
    async fn search_versions(&self, app: &str) -> Result<Vec<String>, ChartError>;

    /// Upgrade-or-install a release pinned to a version; creates the target
    /// namespace when absent. `None` version means the repository's latest.
    async fn upgrade(
        &self,
        full_app: &str,
        release: &str,
        namespace: &str,
        version: Option<&str>,
    ) -> Result<(), ChartError>;
}
