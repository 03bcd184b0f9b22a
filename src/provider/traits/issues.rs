// ABOUTME: Issue operations trait for Git providers.
// ABOUTME: Posting comments on issues linked to a release.

use async_trait::async_trait;

use crate::provider::ProviderError;

/// Issue interactions.
#[async_trait]
pub trait IssueOps: Send + Sync {
    /// Post a comment on an issue.
    async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), ProviderError>;
}
