// ABOUTME: Direct promotion path: upgrade the deployed release in place.
// ABOUTME: Ensures the chart repo is registered, refreshes the index and runs the upgrade.

use tracing::info;

use super::notifier::IssueNotifier;
use super::release::ReleaseInfo;
use crate::activity::{self, ActivityKey, ActivityRecorder};
use crate::chart::ChartClient;
use crate::cluster::Environment;
use crate::config::PromoteConfig;
use crate::error::Result;

/// Upgrades a release directly against the target namespace.
pub struct ReleaseUpdater<'a> {
    chart: &'a dyn ChartClient,
    recorder: &'a dyn ActivityRecorder,
    settings: &'a PromoteConfig,
}

impl<'a> ReleaseUpdater<'a> {
    pub fn new(
        chart: &'a dyn ChartClient,
        recorder: &'a dyn ActivityRecorder,
        settings: &'a PromoteConfig,
    ) -> Self {
        Self {
            chart,
            recorder,
            settings,
        }
    }

    /// Upgrade-or-install the release pinned to the resolved version.
    pub async fn update(
        &self,
        namespace: &str,
        env: Option<&Environment>,
        release: &ReleaseInfo,
        key: &ActivityKey,
        notifier: &IssueNotifier<'_>,
    ) -> Result<()> {
        self.chart
            .ensure_repo(&self.settings.helm_repo_name, &self.settings.helm_repo_url)
            .await?;

        if !self.settings.no_helm_update {
            info!("updating the chart repositories to ensure we can find the latest versions");
            self.chart.update_repos().await?;
        }

        let version = self.settings.version.clone();
        self.recorder
            .apply(
                key,
                Box::new(move |mut activity| {
                    activity = activity::start_update(activity);
                    if !version.is_empty() && activity.version.is_none() {
                        activity.version = Some(version);
                    }
                    activity
                }),
            )
            .await?;

        let pinned = if release.version.is_empty() {
            None
        } else {
            Some(release.version.as_str())
        };
        let outcome = self
            .chart
            .upgrade(
                &release.full_app_name,
                &release.release_name,
                namespace,
                pinned,
            )
            .await;

        match outcome {
            Ok(()) => {
                notifier
                    .comment_on_issues(namespace, env, &release.release_name, key)
                    .await;
                self.recorder
                    .apply(key, Box::new(activity::complete_update))
                    .await?;
                Ok(())
            }
            Err(err) => {
                self.recorder
                    .apply(key, Box::new(activity::fail_update))
                    .await?;
                Err(err.into())
            }
        }
    }
}
