// ABOUTME: Per-promotion release state: names, version and the live pull request.
// ABOUTME: Created once per promote call; only the pull request slot mutates.

use crate::provider::{PullRequest, PullRequestArguments};

/// State of one promotion attempt.
///
/// Exactly one exists per promote call. The release name, app reference and
/// version never change after creation; the pull request slot is replaced
/// wholesale when the GitOps path rebases.
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub release_name: String,
    pub full_app_name: String,
    /// Empty when promoting "latest".
    pub version: String,
    pub pull_request: Option<PullRequestInfo>,
}

impl ReleaseInfo {
    pub fn new(
        release_name: impl Into<String>,
        full_app_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            release_name: release_name.into(),
            full_app_name: full_app_name.into(),
            version: version.into(),
            pull_request: None,
        }
    }
}

/// The live pull request of a GitOps promotion, together with the arguments
/// used to (re-)create it.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    pub pull_request: PullRequest,
    pub arguments: PullRequestArguments,
}
