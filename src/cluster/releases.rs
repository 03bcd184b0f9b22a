// ABOUTME: Release record store: release-notes URLs and linked issues per release.
// ABOUTME: File-backed implementation under the XDG state directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReleaseStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid release record: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A release record written by the release pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes_url: Option<String>,

    #[serde(default)]
    pub issues: Vec<IssueRef>,
}

/// An issue linked to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub state: String,
}

impl IssueRef {
    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }
}

/// Read access to release records.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Look up the record for a release name within a namespace.
    async fn release(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReleaseRecord>, ReleaseStoreError>;
}

/// Store reading `{root}/{namespace}/{name}.yaml` files.
#[derive(Debug)]
pub struct FileReleaseStore {
    root: PathBuf,
}

impl FileReleaseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The default store under `~/.local/state/proago/releases`.
    pub fn in_state_dir() -> Self {
        Self::new(crate::state_dir().join("releases"))
    }
}

#[async_trait]
impl ReleaseStore for FileReleaseStore {
    async fn release(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReleaseRecord>, ReleaseStoreError> {
        let path = self.root.join(namespace).join(format!("{name}.yaml"));
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&content)?))
    }
}
