// ABOUTME: Commit status operations trait for Git providers.
// ABOUTME: Lists CI context reports against a specific commit sha.

use async_trait::async_trait;

use super::shared_types::CommitStatus;
use crate::provider::ProviderError;

/// Commit status queries.
#[async_trait]
pub trait CommitStatusOps: Send + Sync {
    /// Every status reported against `sha`, newest first. Repeated reports
    /// from the same context are all included; callers deduplicate.
    async fn list_commit_statuses(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<CommitStatus>, ProviderError>;
}
