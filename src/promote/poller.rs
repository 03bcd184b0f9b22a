// ABOUTME: The merge status poller: polls a promotion pull request until it lands or fails.
// ABOUTME: One explicit state machine loop; rebase is a state transition, never a recursive call.

use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::notifier::IssueNotifier;
use super::pull_request::PullRequestPromoter;
use super::release::ReleaseInfo;
use crate::activity::{self, ActivityKey, ActivityRecorder, GitStatusEntry, Transition};
use crate::cluster::Environment;
use crate::config::PromoteConfig;
use crate::error::{Error, Result};
use crate::provider::{AggregateStatus, CommitState, GitProvider};

const AUTO_MERGE_MESSAGE: &str = "proago automatically merged promotion pull request";

/// Where the poll loop currently stands.
///
/// `Rebasing` recreates the pull request after a merge conflict and feeds
/// back into `AwaitingMerge`; accumulated loop state (deadline, log gates,
/// per-context status map) survives the transition.
#[derive(Debug)]
pub enum PollState {
    /// Waiting for the pull request to be merged.
    AwaitingMerge,
    /// Merged; waiting for every CI context to report success on the merge
    /// commit.
    AwaitingStatuses { merge_sha: String },
    /// A conflict was detected; the pull request is being recreated.
    Rebasing,
    /// Terminal: promotion landed and all checks passed.
    Succeeded,
    /// Terminal: closed without merge, a failed check, or timeout.
    Failed(Error),
}

/// Log-once gates so repeated poll iterations stay quiet.
#[derive(Debug, Default)]
struct LogGates {
    merge_failure: bool,
    no_merge_sha: bool,
    status_error: bool,
    no_statuses: bool,
}

/// Loop state that must survive rebases.
#[derive(Default)]
struct PollContext {
    gates: LogGates,
    /// Last state seen per context URL; success is sticky.
    url_states: BTreeMap<String, CommitState>,
    url_targets: BTreeMap<String, String>,
}

/// Polls an open promotion pull request until merged-and-verified, closed,
/// timed out, or terminally failed.
pub struct MergeStatusPoller<'a> {
    provider: &'a dyn GitProvider,
    recorder: &'a dyn ActivityRecorder,
    settings: &'a PromoteConfig,
}

impl<'a> MergeStatusPoller<'a> {
    pub fn new(
        provider: &'a dyn GitProvider,
        recorder: &'a dyn ActivityRecorder,
        settings: &'a PromoteConfig,
    ) -> Self {
        Self {
            provider,
            recorder,
            settings,
        }
    }

    /// Block until the pull request held by `release` resolves.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure: [`Error::PullRequestClosed`],
    /// [`Error::CommitStatusFailed`], [`Error::LastCommitFailed`] or
    /// [`Error::PromotionTimeout`].
    pub async fn wait(
        &self,
        promoter: &PullRequestPromoter<'_>,
        notifier: &IssueNotifier<'_>,
        env: &Environment,
        namespace: &str,
        release: &mut ReleaseInfo,
        key: &ActivityKey,
    ) -> Result<()> {
        if release.pull_request.is_none() {
            return Ok(());
        }

        // The deadline is computed once; rebases never extend it.
        let deadline = Instant::now() + self.settings.timeout;
        let mut ctx = PollContext::default();
        let mut state = PollState::AwaitingMerge;

        loop {
            state = match state {
                PollState::Succeeded => return Ok(()),
                PollState::Failed(err) => return Err(err),
                live => live,
            };

            if Instant::now() >= deadline {
                let url = release
                    .pull_request
                    .as_ref()
                    .map(|info| info.pull_request.url.clone())
                    .unwrap_or_default();
                return Err(Error::PromotionTimeout {
                    url,
                    timeout: self.settings.timeout,
                });
            }

            let was_awaiting_merge = matches!(state, PollState::AwaitingMerge);
            let next = match state {
                PollState::AwaitingMerge => self.await_merge(&mut ctx, release, key).await,
                PollState::AwaitingStatuses { merge_sha } => {
                    self.await_statuses(&mut ctx, release, merge_sha, key).await
                }
                PollState::Rebasing => self.rebase(promoter, env, release).await,
                PollState::Succeeded | PollState::Failed(_) => {
                    unreachable!("terminal states are returned above")
                }
            };

            if matches!(next, PollState::Succeeded) {
                info!("merge status checks all passed so the promotion worked!");
                notifier
                    .comment_on_issues(namespace, Some(env), &release.release_name, key)
                    .await;
                self.record(key, Box::new(activity::complete_update)).await;
            }

            // A freshly detected merge is checked for statuses in the same
            // iteration, and conflicts are acted on right away; everything
            // else waits out the poll interval.
            let immediate = (was_awaiting_merge && matches!(next, PollState::AwaitingStatuses { .. }))
                || matches!(
                    next,
                    PollState::Rebasing | PollState::Succeeded | PollState::Failed(_)
                );
            state = next;
            if !immediate {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
    }

    /// One `AwaitingMerge` step: refresh the pull request and decide where
    /// to go next.
    async fn await_merge(
        &self,
        ctx: &mut PollContext,
        release: &mut ReleaseInfo,
        key: &ActivityKey,
    ) -> PollState {
        let info = release
            .pull_request
            .as_mut()
            .expect("pull request must exist while polling");
        let pr = &mut info.pull_request;

        // A failed refresh is retried on the next iteration, bounded by the
        // overall deadline.
        if let Err(err) = self.provider.refresh_pull_request(pr).await {
            warn!("failed to query the pull request status for {}: {err}", pr.url);
            return PollState::AwaitingMerge;
        }

        if pr.merged == Some(true) {
            let Some(sha) = pr.merge_commit_sha.clone() else {
                if !ctx.gates.no_merge_sha {
                    ctx.gates.no_merge_sha = true;
                    info!("pull request {} is merged but waiting for merge sha", pr.url);
                }
                return PollState::AwaitingMerge;
            };

            info!("pull request {} is merged at sha {sha}", pr.url);
            let recorded_sha = sha.clone();
            let recorded_url = pr.url.clone();
            self.record(
                key,
                Box::new(move |mut activity| {
                    activity = activity::complete_pull_request(activity);
                    if activity.pull_request.merge_commit_sha.is_none() {
                        activity.pull_request.merge_commit_sha = Some(recorded_sha);
                    }
                    if activity.pull_request.pull_request_url.is_none() {
                        activity.pull_request.pull_request_url = Some(recorded_url);
                    }
                    activity
                }),
            )
            .await;
            self.record(key, Box::new(activity::start_update)).await;
            return PollState::AwaitingStatuses { merge_sha: sha };
        }

        if pr.is_closed() {
            warn!("pull request {} is closed", pr.url);
            return PollState::Failed(Error::PullRequestClosed(pr.url.clone()));
        }

        // Open: try to merge once the last commit's checks are green.
        match self.provider.last_commit_status(pr).await {
            Err(err) => {
                warn!(
                    "failed to query the pull request last commit status for {} ref {}: {err}",
                    pr.url,
                    pr.last_commit_sha.as_deref().unwrap_or("<unknown>")
                );
            }
            Ok(AggregateStatus::InProgress) => {
                debug!("the build for the pull request last commit is currently in progress");
            }
            Ok(AggregateStatus::Success) => {
                if !self.settings.no_merge {
                    if let Err(err) = self.provider.merge_pull_request(pr, AUTO_MERGE_MESSAGE).await
                    {
                        if !ctx.gates.merge_failure {
                            ctx.gates.merge_failure = true;
                            warn!("failed to merge the pull request {}: {err}", pr.url);
                        }
                    }
                }
            }
            Ok(status @ (AggregateStatus::Error | AggregateStatus::Failure)) => {
                return PollState::Failed(Error::LastCommitFailed {
                    url: pr.url.clone(),
                    sha: pr.last_commit_sha.clone().unwrap_or_default(),
                    status: status.as_str().to_string(),
                });
            }
            Ok(AggregateStatus::Unknown) => {
                warn!("unreadable check status for pull request {}", pr.url);
            }
        }

        if pr.mergeable == Some(false) {
            info!("rebasing pull request due to conflict");
            return PollState::Rebasing;
        }

        PollState::AwaitingMerge
    }

    /// One `AwaitingStatuses` step: gate success on every distinct context
    /// URL reporting success against the merge commit.
    async fn await_statuses(
        &self,
        ctx: &mut PollContext,
        release: &ReleaseInfo,
        merge_sha: String,
        key: &ActivityKey,
    ) -> PollState {
        let info = release
            .pull_request
            .as_ref()
            .expect("pull request must exist while polling");
        let owner = info.pull_request.owner.clone();
        let repo = info.pull_request.repo.clone();

        let statuses = match self
            .provider
            .list_commit_statuses(&owner, &repo, &merge_sha)
            .await
        {
            Err(err) => {
                if !ctx.gates.status_error {
                    ctx.gates.status_error = true;
                    warn!(
                        "failed to query merge status of repo {owner}/{repo} \
                         with merge sha {merge_sha}: {err}"
                    );
                }
                return PollState::AwaitingStatuses { merge_sha };
            }
            Ok(statuses) => statuses,
        };

        if statuses.is_empty() {
            if !ctx.gates.no_statuses {
                ctx.gates.no_statuses = true;
                info!("merge commit has no statuses yet on repo {owner}/{repo} merge sha {merge_sha}");
            }
            return PollState::AwaitingStatuses { merge_sha };
        }

        for status in &statuses {
            // Any single failed context is terminal, regardless of the rest.
            if status.state.is_failed() {
                let target_url = status
                    .target_url
                    .clone()
                    .unwrap_or_else(|| status.url.clone());
                let description = status.description.clone().unwrap_or_default();
                warn!(
                    "merge status: {} URL: {target_url} description: {description}",
                    status.state.as_str()
                );
                return PollState::Failed(Error::CommitStatusFailed {
                    state: status.state.as_str().to_string(),
                    target_url,
                    description,
                });
            }

            // Deduplicate by context URL, log only on change, and keep a
            // context that reached success sticky.
            let seen = ctx.url_states.get(&status.url).copied();
            if seen == Some(CommitState::Success) || seen == Some(status.state) {
                continue;
            }
            ctx.url_states.insert(status.url.clone(), status.state);
            if let Some(target) = &status.target_url {
                ctx.url_targets.insert(status.url.clone(), target.clone());
            }
            info!(
                "merge status: {} for URL {} with target: {} description: {}",
                status.state.as_str(),
                status.url,
                status.target_url.as_deref().unwrap_or(""),
                status.description.as_deref().unwrap_or("")
            );
        }

        let entries: Vec<GitStatusEntry> = ctx
            .url_states
            .iter()
            .map(|(url, state)| GitStatusEntry {
                url: ctx.url_targets.get(url).cloned().unwrap_or_else(|| url.clone()),
                status: state.as_str().to_string(),
            })
            .collect();
        self.record(
            key,
            Box::new(move |mut activity| {
                activity.update.statuses = entries;
                activity
            }),
        )
        .await;

        let succeeded = ctx
            .url_states
            .values()
            .all(|state| *state == CommitState::Success);
        if succeeded {
            PollState::Succeeded
        } else {
            PollState::AwaitingStatuses { merge_sha }
        }
    }

    /// Recreate the pull request after a conflict and resume polling with
    /// the new handle.
    async fn rebase(
        &self,
        promoter: &PullRequestPromoter<'_>,
        env: &Environment,
        release: &mut ReleaseInfo,
    ) -> PollState {
        if let Err(err) = promoter.promote(env, release).await {
            warn!("failed to rebase the promotion pull request: {err}");
        }
        PollState::AwaitingMerge
    }

    /// Ledger updates inside the poll loop are retried implicitly on the
    /// next recording; a failure must not abort the poll.
    async fn record(&self, key: &ActivityKey, transition: Transition) {
        if let Err(err) = self.recorder.apply(key, transition).await {
            warn!("failed to update promotion activity record: {err}");
        }
    }
}
