// ABOUTME: Pull request operations trait for Git providers.
// ABOUTME: Refresh, aggregate status, merge and propose-or-update.

use async_trait::async_trait;

use super::shared_types::{AggregateStatus, PullRequest, PullRequestArguments};
use crate::chart::{ChartError, Requirements};
use crate::provider::ProviderError;

/// The manifest edit applied while proposing a pull request.
pub type RequirementsEdit<'a> =
    &'a (dyn Fn(&mut Requirements) -> Result<(), ChartError> + Send + Sync);

/// Pull request lifecycle operations.
#[async_trait]
pub trait PullRequestOps: Send + Sync {
    /// Refresh the handle's merge state, mergeability and last commit sha
    /// from the provider.
    async fn refresh_pull_request(&self, pr: &mut PullRequest) -> Result<(), ProviderError>;

    /// Aggregate check status of the pull request's last commit.
    async fn last_commit_status(&self, pr: &PullRequest)
    -> Result<AggregateStatus, ProviderError>;

    /// Merge the pull request with the given commit message.
    async fn merge_pull_request(&self, pr: &PullRequest, message: &str)
    -> Result<(), ProviderError>;

    /// Apply the manifest edit on a fresh promotion branch and open a pull
    /// request for it. When `existing` refers to a still-open pull request
    /// its branch is force-updated instead of opening a duplicate.
    async fn propose_pull_request(
        &self,
        args: &PullRequestArguments,
        edit: RequirementsEdit<'_>,
        existing: Option<&PullRequest>,
    ) -> Result<PullRequest, ProviderError>;
}
