// ABOUTME: Scripted mock collaborators: git provider, chart client, registry, locator, releases.
// ABOUTME: Mocks record calls and replay queued snapshots so tests can drive the poller.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use proago::chart::{ChartClient, ChartError, Requirements};
use proago::cluster::{
    Environment, EnvironmentKind, EnvironmentSource, LocatorError, PromotionStrategy,
    RegistryError, ReleaseRecord, ReleaseStore, ReleaseStoreError, EnvironmentRegistry,
    ServiceLocator,
};
use proago::config::PromoteConfig;
use proago::gitinfo::GitInfo;
use proago::provider::{
    AggregateStatus, CommitState, CommitStatus, CommitStatusOps, IssueOps, ProviderError,
    PullRequest, PullRequestArguments, PullRequestOps, RequirementsEdit,
};

/// A promotion config with test-friendly timings.
pub fn test_config(app: &str) -> PromoteConfig {
    let mut config = PromoteConfig::template();
    config.app = app.to_string();
    config.timeout = Duration::from_millis(500);
    config.poll_interval = Duration::from_millis(5);
    config.git_info = Some(GitInfo {
        organisation: "acme".to_string(),
        name: app.to_string(),
        url: format!("https://github.com/acme/{app}"),
    });
    config
}

/// Build an environment definition.
pub fn environment(
    name: &str,
    namespace: &str,
    strategy: PromotionStrategy,
    kind: EnvironmentKind,
    order: i32,
    source_url: Option<&str>,
) -> Environment {
    Environment {
        name: name.to_string(),
        namespace: namespace.to_string(),
        label: None,
        strategy,
        kind,
        source: source_url.map(|url| EnvironmentSource {
            url: url.to_string(),
            base_ref: None,
        }),
        order,
    }
}

/// An open, mergeable pull request snapshot.
pub fn open_pull_request(number: u64) -> PullRequest {
    PullRequest {
        owner: "acme".to_string(),
        repo: "environment-staging".to_string(),
        number,
        url: format!("https://github.com/acme/environment-staging/pull/{number}"),
        title: "myapp to 1.2.3".to_string(),
        closed: false,
        merged: Some(false),
        merge_commit_sha: None,
        mergeable: Some(true),
        last_commit_sha: Some(format!("head-sha-{number}")),
    }
}

/// The same pull request, merged at the given sha.
pub fn merged_pull_request(number: u64, merge_sha: Option<&str>) -> PullRequest {
    let mut pr = open_pull_request(number);
    pr.merged = Some(true);
    pr.merge_commit_sha = merge_sha.map(String::from);
    pr
}

/// Arguments matching the `open_pull_request` snapshots.
pub fn pr_arguments() -> PullRequestArguments {
    PullRequestArguments {
        owner: "acme".to_string(),
        repo: "environment-staging".to_string(),
        source_url: "https://github.com/acme/environment-staging".to_string(),
        branch: "promote-myapp-1.2.3".to_string(),
        base: "master".to_string(),
        title: "myapp to 1.2.3".to_string(),
        body: "Promote myapp to version 1.2.3".to_string(),
    }
}

pub fn status(url: &str, state: CommitState) -> CommitStatus {
    CommitStatus {
        url: url.to_string(),
        state,
        target_url: Some(format!("{url}/build/1")),
        description: Some("ci".to_string()),
    }
}

/// Scripted git provider.
///
/// `refresh_pull_request` replays queued snapshots (repeating the last one
/// once the queue runs dry); proposals mint a new pull request number.
#[derive(Default)]
pub struct MockProvider {
    pub current: Mutex<Option<PullRequest>>,
    pub refreshes: Mutex<VecDeque<PullRequest>>,
    pub refresh_failures: Mutex<u32>,
    pub status_batches: Mutex<VecDeque<Vec<CommitStatus>>>,
    pub last_statuses: Mutex<Vec<CommitStatus>>,
    pub aggregates: Mutex<VecDeque<AggregateStatus>>,
    pub merges: Mutex<Vec<u64>>,
    pub comments: Mutex<Vec<(String, String, u64, String)>>,
    pub proposal_count: Mutex<u64>,
    pub proposed_branches: Mutex<Vec<String>>,
    pub pinned_versions: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a refresh snapshot.
    pub fn push_refresh(&self, pr: PullRequest) {
        self.refreshes.lock().push_back(pr);
    }

    /// Queue a batch of commit statuses for the next listing.
    pub fn push_statuses(&self, statuses: Vec<CommitStatus>) {
        self.status_batches.lock().push_back(statuses);
    }

    pub fn push_aggregate(&self, status: AggregateStatus) {
        self.aggregates.lock().push_back(status);
    }

    fn api_error(url: &str) -> ProviderError {
        ProviderError::Api {
            url: url.to_string(),
            status: 500,
            body: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl PullRequestOps for MockProvider {
    async fn refresh_pull_request(&self, pr: &mut PullRequest) -> Result<(), ProviderError> {
        {
            let mut failures = self.refresh_failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(Self::api_error(&pr.url));
            }
        }
        if let Some(next) = self.refreshes.lock().pop_front() {
            *self.current.lock() = Some(next);
        }
        if let Some(current) = self.current.lock().clone() {
            *pr = current;
        }
        Ok(())
    }

    async fn last_commit_status(
        &self,
        _pr: &PullRequest,
    ) -> Result<AggregateStatus, ProviderError> {
        Ok(self
            .aggregates
            .lock()
            .pop_front()
            .unwrap_or(AggregateStatus::InProgress))
    }

    async fn merge_pull_request(
        &self,
        pr: &PullRequest,
        _message: &str,
    ) -> Result<(), ProviderError> {
        self.merges.lock().push(pr.number);
        Ok(())
    }

    async fn propose_pull_request(
        &self,
        args: &PullRequestArguments,
        edit: RequirementsEdit<'_>,
        _existing: Option<&PullRequest>,
    ) -> Result<PullRequest, ProviderError> {
        let mut requirements = Requirements::default();
        edit(&mut requirements)?;
        if let Some(version) = requirements
            .dependencies
            .first()
            .map(|dep| dep.version.clone())
        {
            self.pinned_versions.lock().push(version);
        }
        self.proposed_branches.lock().push(args.branch.clone());

        let number = {
            let mut count = self.proposal_count.lock();
            *count += 1;
            *count
        };
        let mut pr = open_pull_request(number);
        pr.owner = args.owner.clone();
        pr.repo = args.repo.clone();
        pr.url = format!(
            "https://github.com/{}/{}/pull/{number}",
            args.owner, args.repo
        );
        pr.title = args.title.clone();
        *self.current.lock() = Some(pr.clone());
        Ok(pr)
    }
}

#[async_trait]
impl CommitStatusOps for MockProvider {
    async fn list_commit_statuses(
        &self,
        _owner: &str,
        _repo: &str,
        _sha: &str,
    ) -> Result<Vec<CommitStatus>, ProviderError> {
        if let Some(batch) = self.status_batches.lock().pop_front() {
            *self.last_statuses.lock() = batch.clone();
            return Ok(batch);
        }
        Ok(self.last_statuses.lock().clone())
    }
}

#[async_trait]
impl IssueOps for MockProvider {
    async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), ProviderError> {
        self.comments
            .lock()
            .push((owner.to_string(), repo.to_string(), number, body.to_string()));
        Ok(())
    }
}

/// One recorded upgrade-or-install call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeCall {
    pub full_app: String,
    pub release: String,
    pub namespace: String,
    pub version: Option<String>,
}

/// Scripted chart client.
#[derive(Default)]
pub struct MockChart {
    pub versions: Mutex<Vec<String>>,
    pub upgrades: Mutex<Vec<UpgradeCall>>,
    pub fail_upgrade: Mutex<bool>,
    pub repo_updates: Mutex<u32>,
    pub ensured_repos: Mutex<Vec<(String, String)>>,
}

impl MockChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(versions: &[&str]) -> Self {
        let chart = Self::default();
        *chart.versions.lock() = versions.iter().map(|v| v.to_string()).collect();
        chart
    }
}

#[async_trait]
impl ChartClient for MockChart {
    async fn ensure_repo(&self, alias: &str, url: &str) -> Result<(), ChartError> {
        self.ensured_repos
            .lock()
            .push((alias.to_string(), url.to_string()));
        Ok(())
    }

    async fn update_repos(&self) -> Result<(), ChartError> {
        *self.repo_updates.lock() += 1;
        Ok(())
    }

    async fn search_versions(&self, _app: &str) -> Result<Vec<String>, ChartError> {
        Ok(self.versions.lock().clone())
    }

    async fn upgrade(
        &self,
        full_app: &str,
        release: &str,
        namespace: &str,
        version: Option<&str>,
    ) -> Result<(), ChartError> {
        if *self.fail_upgrade.lock() {
            return Err(ChartError::Command {
                command: "upgrade".to_string(),
                stderr: "scripted failure".to_string(),
            });
        }
        self.upgrades.lock().push(UpgradeCall {
            full_app: full_app.to_string(),
            release: release.to_string(),
            namespace: namespace.to_string(),
            version: version.map(String::from),
        });
        Ok(())
    }
}

/// Registry serving a fixed environment list.
pub struct MockRegistry {
    pub envs: Vec<Environment>,
    pub current: String,
    pub ensured: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new(envs: Vec<Environment>) -> Self {
        Self {
            envs,
            current: "default".to_string(),
            ensured: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EnvironmentRegistry for MockRegistry {
    async fn environments(&self) -> Result<Vec<Environment>, RegistryError> {
        Ok(self.envs.clone())
    }

    async fn current_namespace(&self) -> Result<String, RegistryError> {
        Ok(self.current.clone())
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<(), RegistryError> {
        self.ensured.lock().push(namespace.to_string());
        Ok(())
    }
}

/// Locator answering from fixed maps.
#[derive(Default)]
pub struct MockLocator {
    pub urls: HashMap<(String, String), String>,
    pub hosts: HashMap<(String, String), String>,
}

impl MockLocator {
    pub fn with_service_url(namespace: &str, name: &str, url: &str) -> Self {
        let mut locator = Self::default();
        locator.urls.insert(
            (namespace.to_string(), name.to_string()),
            url.to_string(),
        );
        locator
    }
}

#[async_trait]
impl ServiceLocator for MockLocator {
    async fn service_url(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, LocatorError> {
        Ok(self
            .urls
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn ingress_host(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, LocatorError> {
        Ok(self
            .hosts
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

/// Release store answering from fixed records.
#[derive(Default)]
pub struct MockReleases {
    pub records: HashMap<(String, String), ReleaseRecord>,
}

impl MockReleases {
    pub fn with_record(namespace: &str, record: ReleaseRecord) -> Self {
        let mut store = Self::default();
        store
            .records
            .insert((namespace.to_string(), record.name.clone()), record);
        store
    }
}

#[async_trait]
impl ReleaseStore for MockReleases {
    async fn release(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReleaseRecord>, ReleaseStoreError> {
        Ok(self
            .records
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
