// ABOUTME: Top-level promotion policy: target resolution, path choice and sequencing.
// ABOUTME: Promotes to one environment or sweeps every automatic environment in order.

use parking_lot::Mutex;
use std::time::Duration;
use tracing::{info, warn};

use super::notifier::IssueNotifier;
use super::poller::MergeStatusPoller;
use super::pull_request::PullRequestPromoter;
use super::release::ReleaseInfo;
use super::updater::ReleaseUpdater;
use crate::activity::{self, ActivityKey, ActivityRecorder};
use crate::chart::ChartClient;
use crate::cluster::{
    Environment, EnvironmentRegistry, PromotionStrategy, ReleaseStore, ServiceLocator,
    sort_environments,
};
use crate::config::PromoteConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::provider::GitProvider;

/// Grace period between creating a pull request and polling its status.
const WAIT_AFTER_PULL_REQUEST_CREATED: Duration = Duration::from_secs(3);

/// The promotion coordinator.
pub struct Promoter<'a> {
    settings: &'a PromoteConfig,
    registry: &'a dyn EnvironmentRegistry,
    provider: &'a dyn GitProvider,
    chart: &'a dyn ChartClient,
    recorder: &'a dyn ActivityRecorder,
    locator: &'a dyn ServiceLocator,
    releases: &'a dyn ReleaseStore,
    diagnostics: Mutex<Diagnostics>,
}

impl<'a> Promoter<'a> {
    pub fn new(
        settings: &'a PromoteConfig,
        registry: &'a dyn EnvironmentRegistry,
        provider: &'a dyn GitProvider,
        chart: &'a dyn ChartClient,
        recorder: &'a dyn ActivityRecorder,
        locator: &'a dyn ServiceLocator,
        releases: &'a dyn ReleaseStore,
    ) -> Self {
        Self {
            settings,
            registry,
            provider,
            chart,
            recorder,
            locator,
            releases,
            diagnostics: Mutex::new(Diagnostics::default()),
        }
    }

    /// Warnings collected from best-effort steps during this run.
    pub fn diagnostics(&self) -> parking_lot::MutexGuard<'_, Diagnostics> {
        self.diagnostics.lock()
    }

    /// Promote to the configured target and wait for the result.
    pub async fn run(&self) -> Result<ReleaseInfo> {
        let (namespace, env) = self.resolve_target().await?;
        let mut release = self.promote(&namespace, env.as_ref(), true).await?;
        self.wait_for_promotion(&namespace, env.as_ref(), &mut release)
            .await?;
        Ok(release)
    }

    /// Promote to every automatic permanent environment, in ascending order.
    ///
    /// Deliberately sequential and fail-fast: the first failure aborts the
    /// remaining sequence so a later stage never skips ahead of a failed one.
    pub async fn promote_all_automatic(&self) -> Result<()> {
        let mut environments = self.registry.environments().await?;
        if environments.is_empty() {
            warn!("no environments have been created yet; nothing to promote");
            return Ok(());
        }
        sort_environments(&mut environments);

        for env in environments
            .iter()
            .filter(|env| {
                env.strategy == PromotionStrategy::Automatic && env.kind.is_permanent()
            })
        {
            if env.namespace.is_empty() {
                return Err(Error::NoNamespace(env.name.clone()));
            }
            let mut release = self.promote(&env.namespace, Some(env), false).await?;
            self.wait_for_promotion(&env.namespace, Some(env), &mut release)
                .await?;
        }
        Ok(())
    }

    /// Resolve the target namespace and, when named, the environment.
    async fn resolve_target(&self) -> Result<(String, Option<Environment>)> {
        let environments = self.registry.environments().await?;
        if environments.is_empty() {
            return Err(Error::NoEnvironments);
        }

        let (namespace, env) = if let Some(name) = self.settings.environment.as_deref() {
            let Some(env) = environments.iter().find(|env| env.name == name).cloned() else {
                let mut known: Vec<String> =
                    environments.into_iter().map(|env| env.name).collect();
                known.sort();
                return Err(Error::UnknownEnvironment {
                    name: name.to_string(),
                    known,
                });
            };
            if env.namespace.is_empty() {
                return Err(Error::NoNamespace(env.name));
            }
            (env.namespace.clone(), Some(env))
        } else if let Some(namespace) = self.settings.namespace.clone() {
            (namespace, None)
        } else {
            (self.registry.current_namespace().await?, None)
        };

        self.registry.ensure_namespace(&namespace).await?;
        Ok((namespace, env))
    }

    /// Promote the configured app into one namespace.
    ///
    /// `warn_if_auto` asks for confirmation when targeting an automatic
    /// environment outside an all-automatic sweep; declining returns the
    /// untouched release with no error.
    pub async fn promote(
        &self,
        namespace: &str,
        env: Option<&Environment>,
        warn_if_auto: bool,
    ) -> Result<ReleaseInfo> {
        let app = &self.settings.app;
        let version = &self.settings.version;
        if version.is_empty() {
            info!("promoting latest version of app {app} to namespace {namespace}");
        } else {
            info!("promoting app {app} version {version} to namespace {namespace}");
        }

        let mut release = ReleaseInfo::new(
            self.settings.release_name(namespace),
            self.settings.full_app_name(),
            version.clone(),
        );

        if warn_if_auto
            && env.is_some_and(|env| env.strategy == PromotionStrategy::Automatic)
            && !self.confirm_automatic(env.expect("checked above"))?
        {
            return Ok(release);
        }

        let key = self.promote_key(env, namespace);

        if let Some(env) = env.filter(|env| env.uses_gitops()) {
            let promoter = PullRequestPromoter::new(self.provider, self.chart, self.settings);
            promoter.promote(env, &mut release).await?;

            let url = release
                .pull_request
                .as_ref()
                .map(|info| info.pull_request.url.clone());
            let version = version.clone();
            self.recorder
                .apply(
                    &key,
                    Box::new(move |mut activity| {
                        activity = activity::start_pull_request(activity);
                        if activity.pull_request.pull_request_url.is_none() {
                            activity.pull_request.pull_request_url = url;
                        }
                        if !version.is_empty() && activity.version.is_none() {
                            activity.version = Some(version);
                        }
                        activity
                    }),
                )
                .await?;

            // Give the provider a moment before the first status poll.
            tokio::time::sleep(WAIT_AFTER_PULL_REQUEST_CREATED).await;
            return Ok(release);
        }

        let updater = ReleaseUpdater::new(self.chart, self.recorder, self.settings);
        let notifier = self.notifier();
        updater
            .update(namespace, env, &release, &key, &notifier)
            .await?;
        Ok(release)
    }

    /// Wait for a GitOps promotion to land; direct updates are already done.
    pub async fn wait_for_promotion(
        &self,
        namespace: &str,
        env: Option<&Environment>,
        release: &mut ReleaseInfo,
    ) -> Result<()> {
        if release.pull_request.is_none() {
            return Ok(());
        }
        let env = env.expect("a pull request promotion always has an environment");
        let key = self.promote_key(Some(env), namespace);

        let promoter = PullRequestPromoter::new(self.provider, self.chart, self.settings);
        let notifier = self.notifier();
        let poller = MergeStatusPoller::new(self.provider, self.recorder, self.settings);
        let outcome = poller
            .wait(&promoter, &notifier, env, namespace, release, &key)
            .await;

        if let Err(err) = outcome {
            if let Err(record_err) = self
                .recorder
                .apply(&key, Box::new(activity::fail_pull_request))
                .await
            {
                warn!("failed to record pull request failure: {record_err}");
            }
            return Err(err);
        }
        Ok(())
    }

    fn notifier(&self) -> IssueNotifier<'_> {
        IssueNotifier::new(
            self.provider,
            self.locator,
            self.releases,
            self.recorder,
            self.settings,
            &self.diagnostics,
        )
    }

    fn promote_key(&self, env: Option<&Environment>, namespace: &str) -> ActivityKey {
        let environment = env.map_or(namespace, |env| env.name.as_str());
        ActivityKey::derive(environment, self.settings.git_info.as_ref())
    }

    /// Ask before promoting into an automatic environment by hand. In batch
    /// mode the default answer (decline) is taken without prompting.
    fn confirm_automatic(&self, env: &Environment) -> Result<bool> {
        warn!(
            "environment {} is set up to promote automatically as part of the CI/CD pipelines",
            env.name
        );
        if self.settings.batch {
            info!("running non-interactively; skipping promotion to {}", env.name);
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt("Do you wish to promote anyway?")
            .default(false)
            .interact()
            .map_err(|err| Error::Prompt(err.to_string()))
    }
}
