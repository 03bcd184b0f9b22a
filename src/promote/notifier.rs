// ABOUTME: Best-effort issue notifications after a successful promotion.
// ABOUTME: Resolves the application URL and comments on closed issues of the release.

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::activity::{ActivityKey, ActivityRecorder};
use crate::cluster::{Environment, ReleaseStore, ServiceLocator};
use crate::config::PromoteConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::provider::GitProvider;
use crate::types::ResourceName;

/// Posts "the fix is deployed" comments on issues linked to a release.
///
/// Everything here is best-effort: failures are logged and collected as
/// diagnostics, never propagated.
pub struct IssueNotifier<'a> {
    provider: &'a dyn GitProvider,
    locator: &'a dyn ServiceLocator,
    releases: &'a dyn ReleaseStore,
    recorder: &'a dyn ActivityRecorder,
    settings: &'a PromoteConfig,
    diagnostics: &'a Mutex<Diagnostics>,
}

impl<'a> IssueNotifier<'a> {
    pub fn new(
        provider: &'a dyn GitProvider,
        locator: &'a dyn ServiceLocator,
        releases: &'a dyn ReleaseStore,
        recorder: &'a dyn ActivityRecorder,
        settings: &'a PromoteConfig,
        diagnostics: &'a Mutex<Diagnostics>,
    ) -> Self {
        Self {
            provider,
            locator,
            releases,
            recorder,
            settings,
            diagnostics,
        }
    }

    /// Comment on every closed issue of the promoted release.
    pub async fn comment_on_issues(
        &self,
        namespace: &str,
        env: Option<&Environment>,
        release_name: &str,
        key: &ActivityKey,
    ) {
        let namespace = env.map_or(namespace, |env| env.namespace.as_str());
        let env_label = env.map_or(namespace, |env| env.label());
        let app = &self.settings.app;
        let version = &self.settings.version;

        if version.is_empty() {
            warn!("no version name so cannot comment on issues that they are now in {env_label}");
            return;
        }
        let Some(git) = self.settings.git_info.as_ref() else {
            self.diagnostics.lock().warn(Warning::git_metadata(format!(
                "no git repository metadata discovered so cannot comment on issues \
                 that they are now in {env_label}"
            )));
            return;
        };

        let url = self.resolve_application_url(namespace, release_name).await;
        if let Some(url) = url.as_deref() {
            info!("application is available at: {url}");
            let url = url.to_string();
            let result = self
                .recorder
                .apply(
                    key,
                    Box::new(move |mut activity| {
                        if activity.application_url.is_none() {
                            activity.application_url = Some(url);
                        }
                        activity
                    }),
                )
                .await;
            if let Err(err) = result {
                warn!("failed to record application URL: {err}");
            }
        }

        let record_name = ResourceName::sanitize_with_dots(&format!("{app}-{version}"));
        let record = match self.releases.release(namespace, record_name.as_str()).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(err) => {
                self.diagnostics.lock().warn(Warning::release_lookup(format!(
                    "failed to look up release {record_name} in {namespace}: {err}"
                )));
                return;
            }
        };

        let version_message = match record.release_notes_url.as_deref() {
            Some(notes) => format!("[{version}]({notes})"),
            None => version.clone(),
        };
        let available = match url.as_deref() {
            Some(url) => format!(" and available [here]({url})"),
            None => String::new(),
        };

        for issue in record.issues.iter().filter(|issue| issue.is_closed()) {
            let Ok(number) = issue.id.parse::<u64>() else {
                warn!("could not parse issue id {} for URL {}", issue.id, issue.url);
                continue;
            };
            info!("commenting that issue {} is now in {env_label}", issue.url);
            let comment = format!(
                ":white_check_mark: the fix for this issue is now deployed to \
                 **{env_label}** in version {version_message}{available}"
            );
            if let Err(err) = self
                .provider
                .create_issue_comment(&git.organisation, &git.name, number, &comment)
                .await
            {
                self.diagnostics.lock().warn(Warning::issue_comment(format!(
                    "failed to add comment to issue {}: {err}",
                    issue.url
                )));
            }
        }
    }

    /// Probe the known service names, then ingresses, for a reachable URL.
    async fn resolve_application_url(
        &self,
        namespace: &str,
        release_name: &str,
    ) -> Option<String> {
        let app = self.settings.app.as_str();
        let mut names = vec![app.to_string(), release_name.to_string()];
        names.push(format!("{namespace}-{app}"));
        names.dedup();

        for name in &names {
            match self.locator.service_url(namespace, name).await {
                Ok(Some(url)) => return Some(url),
                Ok(None) => {}
                Err(err) => {
                    self.diagnostics.lock().warn(Warning::service_url(format!(
                        "failed to look up service {name} in {namespace}: {err}"
                    )));
                }
            }
        }

        for name in [app, release_name] {
            match self.locator.ingress_host(namespace, name).await {
                Ok(Some(host)) => return Some(host),
                Ok(None) => {}
                Err(err) => {
                    self.diagnostics.lock().warn(Warning::service_url(format!(
                        "failed to look up ingress {name} in {namespace}: {err}"
                    )));
                }
            }
        }

        warn!(
            "could not find the service URL in namespace {namespace} for names {}",
            names.join(", ")
        );
        None
    }
}
