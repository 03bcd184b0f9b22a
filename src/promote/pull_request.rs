// ABOUTME: GitOps promotion path: propose a pull request pinning the new version.
// ABOUTME: Builds branch name, title and manifest edit, then delegates to the provider.

use tracing::info;

use super::release::{PullRequestInfo, ReleaseInfo};
use crate::chart::{ChartClient, ChartError, Requirements};
use crate::cluster::Environment;
use crate::config::PromoteConfig;
use crate::error::{Error, Result};
use crate::gitinfo::parse_owner_repo;
use crate::provider::{GitProvider, PullRequestArguments};
use crate::version::VersionResolver;

/// Promotes by editing the version pin inside an environment's manifest
/// repository through a pull request.
pub struct PullRequestPromoter<'a> {
    provider: &'a dyn GitProvider,
    chart: &'a dyn ChartClient,
    settings: &'a PromoteConfig,
}

impl<'a> PullRequestPromoter<'a> {
    pub fn new(
        provider: &'a dyn GitProvider,
        chart: &'a dyn ChartClient,
        settings: &'a PromoteConfig,
    ) -> Self {
        Self {
            provider,
            chart,
            settings,
        }
    }

    /// Create the promotion pull request, or refresh the one already held
    /// by `release` (the rebase case). Replaces `release.pull_request`.
    pub async fn promote(&self, env: &Environment, release: &mut ReleaseInfo) -> Result<()> {
        let app = &self.settings.app;
        let version_name = if release.version.is_empty() {
            "latest"
        } else {
            release.version.as_str()
        };

        let source_url = env
            .source
            .as_ref()
            .map(|source| source.url.clone())
            .unwrap_or_default();
        let Some((owner, repo)) = parse_owner_repo(&source_url) else {
            return Err(Error::InvalidSourceUrl {
                name: env.name.clone(),
                url: source_url,
            });
        };

        let args = PullRequestArguments {
            owner,
            repo,
            source_url,
            branch: format!("promote-{app}-{version_name}"),
            base: env.base_ref().to_string(),
            title: format!("{app} to {version_name}"),
            body: format!("Promote {app} to version {version_name}"),
        };

        // Resolve the version at propose time so a rebase picks up the
        // latest release again.
        let version = if release.version.is_empty() {
            VersionResolver::new(self.chart).latest(app).await?
        } else {
            release.version.clone()
        };
        let repo_url = self.settings.helm_repo_url.clone();
        let pin_app = app.clone();
        let edit = move |requirements: &mut Requirements| -> std::result::Result<(), ChartError> {
            requirements.set_app_version(&pin_app, &version, &repo_url);
            Ok(())
        };

        let existing = release
            .pull_request
            .as_ref()
            .map(|info| info.pull_request.clone());
        let pull_request = self
            .provider
            .propose_pull_request(&args, &edit, existing.as_ref())
            .await?;

        info!(url = %pull_request.url, "promotion pull request ready");
        release.pull_request = Some(PullRequestInfo {
            pull_request,
            arguments: args,
        });
        Ok(())
    }
}
