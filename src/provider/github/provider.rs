// ABOUTME: GitHub REST API client implementing the provider capability traits.
// ABOUTME: Pull request refresh, commit statuses, merging and issue comments.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::path::PathBuf;

use crate::provider::error::{DecodeSnafu, MissingTokenSnafu, RequestSnafu};
use crate::provider::traits::{
    AggregateStatus, CommitStatus, CommitStatusOps, CommitState, IssueOps, PullRequest,
    PullRequestOps, PullRequestArguments, RequirementsEdit,
};
use crate::provider::ProviderError;

pub(super) const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "proago";

/// Git provider backed by the GitHub REST API.
pub struct GitHubProvider {
    client: reqwest::Client,
    api_base: String,
    pub(super) token: String,
    /// Where environment repositories are cloned for promotion branches.
    pub(super) clone_root: PathBuf,
}

impl GitHubProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            clone_root: crate::state_dir().join("gitops"),
        }
    }

    /// Build a provider from the `GITHUB_TOKEN` environment variable.
    pub fn from_env() -> Result<Self, ProviderError> {
        match std::env::var("GITHUB_TOKEN") {
            Ok(token) if !token.is_empty() => Ok(Self::new(token)),
            _ => MissingTokenSnafu { host: "github.com" }.fail(),
        }
    }

    /// Override the API base URL, for GitHub Enterprise installs.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the directory environment repositories are cloned into.
    pub fn with_clone_root(mut self, clone_root: impl Into<PathBuf>) -> Self {
        self.clone_root = clone_root.into();
        self
    }

    pub(super) fn repo_url(&self, owner: &str, repo: &str, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, owner, repo, tail)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .context(RequestSnafu { url })?;
        Self::decode(url, response).await
    }

    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, ProviderError> {
        let response = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .context(RequestSnafu { url })?;
        Self::decode(url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.context(DecodeSnafu { url })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiPullRequest {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub mergeable: Option<bool>,
    pub head: ApiRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiRef {
    pub sha: String,
}

impl ApiPullRequest {
    pub(super) fn into_pull_request(self, owner: &str, repo: &str) -> PullRequest {
        PullRequest {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: self.number,
            url: self.html_url,
            title: self.title,
            closed: self.state == "closed",
            merged: self.merged,
            merge_commit_sha: self.merge_commit_sha,
            mergeable: self.mergeable,
            last_commit_sha: Some(self.head.sha),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    url: String,
    state: String,
    #[serde(default)]
    target_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCombinedStatus {
    state: String,
}

#[async_trait]
impl PullRequestOps for GitHubProvider {
    async fn refresh_pull_request(&self, pr: &mut PullRequest) -> Result<(), ProviderError> {
        let url = self.repo_url(&pr.owner, &pr.repo, &format!("pulls/{}", pr.number));
        let api: ApiPullRequest = self.get_json(&url).await?;
        *pr = api.into_pull_request(&pr.owner, &pr.repo);
        Ok(())
    }

    async fn last_commit_status(
        &self,
        pr: &PullRequest,
    ) -> Result<AggregateStatus, ProviderError> {
        let Some(sha) = pr.last_commit_sha.as_deref() else {
            return Ok(AggregateStatus::Unknown);
        };
        let url = self.repo_url(&pr.owner, &pr.repo, &format!("commits/{sha}/status"));
        let combined: ApiCombinedStatus = self.get_json(&url).await?;
        Ok(match combined.state.as_str() {
            "pending" => AggregateStatus::InProgress,
            "success" => AggregateStatus::Success,
            "error" => AggregateStatus::Error,
            "failure" => AggregateStatus::Failure,
            _ => AggregateStatus::Unknown,
        })
    }

    async fn merge_pull_request(
        &self,
        pr: &PullRequest,
        message: &str,
    ) -> Result<(), ProviderError> {
        let url = self.repo_url(&pr.owner, &pr.repo, &format!("pulls/{}/merge", pr.number));
        let body = serde_json::json!({ "commit_message": message });
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, &url, &body)
            .await?;
        Ok(())
    }

    async fn propose_pull_request(
        &self,
        args: &PullRequestArguments,
        edit: RequirementsEdit<'_>,
        existing: Option<&PullRequest>,
    ) -> Result<PullRequest, ProviderError> {
        self.propose(args, edit, existing).await
    }
}

#[async_trait]
impl CommitStatusOps for GitHubProvider {
    async fn list_commit_statuses(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<CommitStatus>, ProviderError> {
        let url = self.repo_url(owner, repo, &format!("commits/{sha}/statuses"));
        let statuses: Vec<ApiStatus> = self.get_json(&url).await?;
        Ok(statuses
            .into_iter()
            .map(|status| CommitStatus {
                url: status.url,
                state: CommitState::parse(&status.state),
                target_url: status.target_url,
                description: status.description,
            })
            .collect())
    }
}

#[async_trait]
impl IssueOps for GitHubProvider {
    async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), ProviderError> {
        let url = self.repo_url(owner, repo, &format!("issues/{number}/comments"));
        let payload = serde_json::json!({ "body": body });
        let _: serde_json::Value = self
            .send_json(reqwest::Method::POST, &url, &payload)
            .await?;
        Ok(())
    }
}
