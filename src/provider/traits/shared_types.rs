// ABOUTME: Shared wire types for Git provider operations.
// ABOUTME: Pull requests, commit statuses and pull request creation arguments.

use serde::{Deserialize, Serialize};

/// A provider-side pull request handle, refreshed in place while polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub url: String,
    pub title: String,

    /// Closed without necessarily being merged.
    #[serde(default)]
    pub closed: bool,

    /// `None` until the provider has reported merge state.
    #[serde(default)]
    pub merged: Option<bool>,

    #[serde(default)]
    pub merge_commit_sha: Option<String>,

    /// `None` while the provider is still computing mergeability.
    #[serde(default)]
    pub mergeable: Option<bool>,

    #[serde(default)]
    pub last_commit_sha: Option<String>,
}

impl PullRequest {
    /// Closed without merging.
    pub fn is_closed(&self) -> bool {
        self.closed && self.merged != Some(true)
    }
}

/// The state a CI context reports against a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Error,
    Failure,
}

impl CommitState {
    /// Parse a provider-reported state, treating anything unknown as pending.
    pub fn parse(value: &str) -> Self {
        match value {
            "success" => CommitState::Success,
            "error" => CommitState::Error,
            "failure" => CommitState::Failure,
            _ => CommitState::Pending,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CommitState::Error | CommitState::Failure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Error => "error",
            CommitState::Failure => "failure",
        }
    }
}

/// One CI context's report against a specific commit sha.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    /// Context URL, the deduplication key across repeated reports.
    pub url: String,
    pub state: CommitState,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Aggregate check state of a pull request's last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    InProgress,
    Success,
    Error,
    Failure,
    Unknown,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::InProgress => "in-progress",
            AggregateStatus::Success => "success",
            AggregateStatus::Error => "error",
            AggregateStatus::Failure => "failure",
            AggregateStatus::Unknown => "unknown",
        }
    }
}

/// Everything needed to (re-)create a promotion pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestArguments {
    pub owner: String,
    pub repo: String,
    /// Clone URL of the environment's manifest repository.
    pub source_url: String,
    /// Head branch carrying the manifest edit.
    pub branch: String,
    /// Base branch the pull request targets.
    pub base: String,
    pub title: String,
    pub body: String,
}
