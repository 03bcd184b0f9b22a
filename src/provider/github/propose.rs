// ABOUTME: Propose-or-update of promotion pull requests against environment repositories.
// ABOUTME: Maintains a cached clone, rewrites the promotion branch and opens or refreshes the PR.

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::provider::{ApiPullRequest, GitHubProvider};
use crate::chart::{REQUIREMENTS_FILE, Requirements};
use crate::gitinfo::parse_owner_repo;
use crate::provider::ProviderError;
use crate::provider::traits::{PullRequest, PullRequestArguments, PullRequestOps, RequirementsEdit};

const COMMIT_AUTHOR_NAME: &str = "proago";
const COMMIT_AUTHOR_EMAIL: &str = "proago@localhost";

impl GitHubProvider {
    pub(super) async fn propose(
        &self,
        args: &PullRequestArguments,
        edit: RequirementsEdit<'_>,
        existing: Option<&PullRequest>,
    ) -> Result<PullRequest, ProviderError> {
        let dir = self.clone_root.join(format!("{}-{}", args.owner, args.repo));
        self.sync_clone(&args.source_url, &dir).await?;

        self.git(
            &dir,
            &[
                "checkout",
                "-B",
                &args.branch,
                &format!("origin/{}", args.base),
            ],
        )
        .await?;

        let manifest = dir.join(REQUIREMENTS_FILE);
        let mut requirements = Requirements::load(&manifest)?;
        edit(&mut requirements)?;
        requirements.save(&manifest)?;

        let status = self.git(&dir, &["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            debug!(branch = %args.branch, "manifest already up to date");
        } else {
            self.git(&dir, &["add", "--all"]).await?;
            self.git(
                &dir,
                &[
                    "-c",
                    &format!("user.name={COMMIT_AUTHOR_NAME}"),
                    "-c",
                    &format!("user.email={COMMIT_AUTHOR_EMAIL}"),
                    "commit",
                    "--message",
                    &args.body,
                ],
            )
            .await?;
        }
        self.git(&dir, &["push", "--force", "origin", &args.branch])
            .await?;

        // A prior unmerged pull request for this promotion is refreshed by
        // the branch push; reuse its handle rather than opening a duplicate.
        if let Some(existing) = existing {
            let mut refreshed = existing.clone();
            if self.refresh_pull_request(&mut refreshed).await.is_ok()
                && !refreshed.closed
                && refreshed.merged != Some(true)
            {
                info!(url = %refreshed.url, "updated existing promotion pull request");
                return Ok(refreshed);
            }
        }
        if let Some(open) = self.find_open_pull_request(args).await? {
            info!(url = %open.url, "updated existing promotion pull request");
            return Ok(open);
        }

        let url = self.repo_url(&args.owner, &args.repo, "pulls");
        let body = serde_json::json!({
            "title": args.title,
            "head": args.branch,
            "base": args.base,
            "body": args.body,
        });
        let created: ApiPullRequest = self
            .send_json(reqwest::Method::POST, &url, &body)
            .await?;
        let pr = created.into_pull_request(&args.owner, &args.repo);
        info!(url = %pr.url, "created promotion pull request");
        Ok(pr)
    }

    /// Find an open pull request whose head is the promotion branch.
    async fn find_open_pull_request(
        &self,
        args: &PullRequestArguments,
    ) -> Result<Option<PullRequest>, ProviderError> {
        let head = format!("{}:{}", args.owner, args.branch);
        let url = format!(
            "{}?head={}&state=open",
            self.repo_url(&args.owner, &args.repo, "pulls"),
            urlencoding::encode(&head)
        );
        let open: Vec<ApiPullRequest> = self.get_json(&url).await?;
        Ok(open
            .into_iter()
            .next()
            .map(|pr| pr.into_pull_request(&args.owner, &args.repo)))
    }

    /// Clone the environment repository into `dir`, or fetch when the cached
    /// clone already exists.
    async fn sync_clone(&self, source_url: &str, dir: &Path) -> Result<(), ProviderError> {
        let auth_url = self.authenticated_url(source_url)?;
        if dir.join(".git").exists() {
            self.git(dir, &["fetch", "origin", "--prune"]).await?;
            return Ok(());
        }
        std::fs::create_dir_all(&self.clone_root)
            .map_err(|source| ProviderError::GitSpawn { source })?;
        let dir_name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("environment");
        self.git(&self.clone_root, &["clone", &auth_url, dir_name])
            .await?;
        Ok(())
    }

    /// Rewrite an https clone URL to carry the access token.
    fn authenticated_url(&self, source_url: &str) -> Result<String, ProviderError> {
        let Some(rest) = source_url.strip_prefix("https://") else {
            return Err(ProviderError::UnsupportedUrl {
                url: source_url.to_string(),
            });
        };
        if parse_owner_repo(source_url).is_none() {
            return Err(ProviderError::UnsupportedUrl {
                url: source_url.to_string(),
            });
        }
        Ok(format!("https://x-access-token:{}@{}", self.token, rest))
    }

    async fn git(&self, dir: &Path, git_args: &[&str]) -> Result<String, ProviderError> {
        debug!(command = %format!("git {}", git_args.join(" ")), "running git");
        let output = Command::new("git")
            .args(git_args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|source| ProviderError::GitSpawn { source })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr)
                .replace(&self.token, "***");
            return Err(ProviderError::Git {
                command: git_args.first().copied().unwrap_or("git").to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
