// ABOUTME: Integration tests for the promotion coordinator.
// ABOUTME: Target resolution, path choice, confirmation and the all-automatic sweep.

mod support;

use proago::activity::{ActivityKey, MemoryRecorder, StepStatus};
use proago::cluster::{
    Environment, EnvironmentKind, IssueRef, PromotionStrategy, ReleaseRecord,
};
use proago::error::Error;
use proago::promote::Promoter;
use proago::provider::CommitState;
use support::mocks::{
    self, MockChart, MockLocator, MockProvider, MockRegistry, MockReleases, environment,
    merged_pull_request, open_pull_request, status,
};

/// Collaborator set wired against mocks.
struct World {
    registry: MockRegistry,
    provider: MockProvider,
    chart: MockChart,
    recorder: MemoryRecorder,
    locator: MockLocator,
    releases: MockReleases,
}

impl World {
    fn new(envs: Vec<Environment>) -> Self {
        Self {
            registry: MockRegistry::new(envs),
            provider: MockProvider::new(),
            chart: MockChart::with_versions(&["1.0.0", "1.2.0", "0.9.5"]),
            recorder: MemoryRecorder::new(),
            locator: MockLocator::default(),
            releases: MockReleases::default(),
        }
    }

    fn promoter<'a>(&'a self, settings: &'a proago::config::PromoteConfig) -> Promoter<'a> {
        Promoter::new(
            settings,
            &self.registry,
            &self.provider,
            &self.chart,
            &self.recorder,
            &self.locator,
            &self.releases,
        )
    }
}

fn mixed_environments() -> Vec<Environment> {
    vec![
        environment(
            "production",
            "ns-production",
            PromotionStrategy::Automatic,
            EnvironmentKind::Permanent,
            300,
            None,
        ),
        environment(
            "preview-pr-1",
            "ns-preview",
            PromotionStrategy::Automatic,
            EnvironmentKind::Preview,
            50,
            None,
        ),
        environment(
            "staging",
            "ns-staging",
            PromotionStrategy::Automatic,
            EnvironmentKind::Permanent,
            100,
            None,
        ),
        environment(
            "qa",
            "ns-qa",
            PromotionStrategy::Manual,
            EnvironmentKind::Permanent,
            200,
            None,
        ),
    ]
}

/// Test: the all-automatic sweep visits exactly the automatic permanent
/// environments, in ascending order.
#[tokio::test]
async fn all_automatic_visits_automatic_permanent_subset_in_order() {
    let world = World::new(mixed_environments());
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();

    world
        .promoter(&settings)
        .promote_all_automatic()
        .await
        .expect("sweep should succeed");

    let namespaces: Vec<String> = world
        .chart
        .upgrades
        .lock()
        .iter()
        .map(|call| call.namespace.clone())
        .collect();
    assert_eq!(namespaces, vec!["ns-staging", "ns-production"]);
}

/// Test: the first failure aborts the rest of the sweep.
#[tokio::test]
async fn all_automatic_stops_at_first_failure() {
    let world = World::new(mixed_environments());
    *world.chart.fail_upgrade.lock() = true;
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();

    let err = world
        .promoter(&settings)
        .promote_all_automatic()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Chart(_)));

    // Only the first environment was attempted.
    assert_eq!(world.chart.ensured_repos.lock().len(), 1);
    assert!(world.chart.upgrades.lock().is_empty());
}

/// Test: an empty registry makes the sweep a warning, not an error.
#[tokio::test]
async fn all_automatic_with_no_environments_is_a_noop() {
    let world = World::new(Vec::new());
    let settings = mocks::test_config("myapp");
    world
        .promoter(&settings)
        .promote_all_automatic()
        .await
        .expect("empty sweep should succeed");
    assert!(world.chart.upgrades.lock().is_empty());
}

/// Test: resolving an unknown environment fails and lists every known name.
#[tokio::test]
async fn unknown_environment_lists_known_names() {
    let world = World::new(mixed_environments());
    let mut settings = mocks::test_config("myapp");
    settings.environment = Some("nope".to_string());

    let err = world.promoter(&settings).run().await.unwrap_err();
    match err {
        Error::UnknownEnvironment { name, known } => {
            assert_eq!(name, "nope");
            assert_eq!(known, vec!["preview-pr-1", "production", "qa", "staging"]);
        }
        other => panic!("expected UnknownEnvironment, got {other}"),
    }
}

/// Test: no configured environments at all is a configuration error.
#[tokio::test]
async fn no_environments_is_an_error() {
    let world = World::new(Vec::new());
    let settings = mocks::test_config("myapp");
    let err = world.promoter(&settings).run().await.unwrap_err();
    assert!(matches!(err, Error::NoEnvironments));
}

/// Test: the direct path end to end. A manual environment without a source
/// repo upgrades the release once, records the update step and fires the
/// issue notifier best-effort.
#[tokio::test]
async fn direct_path_upgrades_release_and_notifies() {
    let mut envs = mixed_environments();
    envs.push(environment(
        "prod-direct",
        "production",
        PromotionStrategy::Manual,
        EnvironmentKind::Permanent,
        400,
        None,
    ));
    let mut world = World::new(envs);
    world.locator = MockLocator::with_service_url(
        "production",
        "production-myapp",
        "http://myapp.example.com",
    );
    world.releases = MockReleases::with_record(
        "production",
        ReleaseRecord {
            name: "myapp-2.0.0".to_string(),
            release_notes_url: Some(
                "https://github.com/acme/myapp/releases/tag/v2.0.0".to_string(),
            ),
            issues: vec![IssueRef {
                id: "7".to_string(),
                url: "https://github.com/acme/myapp/issues/7".to_string(),
                state: "closed".to_string(),
            }],
        },
    );

    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();
    settings.environment = Some("prod-direct".to_string());
    settings.helm_repo_name = "repo".to_string();

    let release = world
        .promoter(&settings)
        .run()
        .await
        .expect("promotion should succeed");
    assert_eq!(release.release_name, "production-myapp");
    assert!(release.pull_request.is_none());

    let upgrades = world.chart.upgrades.lock();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].full_app, "repo/myapp");
    assert_eq!(upgrades[0].release, "production-myapp");
    assert_eq!(upgrades[0].namespace, "production");
    assert_eq!(upgrades[0].version.as_deref(), Some("2.0.0"));

    let key = ActivityKey::derive("prod-direct", settings.git_info.as_ref());
    let activity = world.recorder.get(&key).expect("record exists");
    assert_eq!(activity.update.status, StepStatus::Succeeded);
    assert_eq!(
        activity.application_url.as_deref(),
        Some("http://myapp.example.com")
    );

    let comments = world.provider.comments.lock();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].3.contains("prod-direct"));
    assert!(comments[0].3.contains("2.0.0"));
    assert!(comments[0].3.contains("http://myapp.example.com"));
}

/// Test: a failing upgrade records a failed update step and propagates.
#[tokio::test]
async fn direct_path_failure_records_failed_update() {
    let world = World::new(mixed_environments());
    *world.chart.fail_upgrade.lock() = true;
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();
    settings.environment = Some("qa".to_string());

    let err = world.promoter(&settings).run().await.unwrap_err();
    assert!(matches!(err, Error::Chart(_)));

    let key = ActivityKey::derive("qa", settings.git_info.as_ref());
    let activity = world.recorder.get(&key).expect("record exists");
    assert_eq!(activity.update.status, StepStatus::Failed);
}

/// Test: promoting by hand into an automatic environment is declined in
/// batch mode, with no error and no side effects.
#[tokio::test]
async fn batch_mode_declines_automatic_environment() {
    let world = World::new(mixed_environments());
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();
    settings.environment = Some("staging".to_string());
    settings.batch = true;

    let release = world
        .promoter(&settings)
        .run()
        .await
        .expect("declined promotion is not an error");
    assert!(release.pull_request.is_none());
    assert!(world.chart.upgrades.lock().is_empty());
}

/// Test: a namespace-only promotion skips the environment registry checks
/// and upgrades directly into that namespace.
#[tokio::test]
async fn namespace_override_promotes_directly() {
    let world = World::new(mixed_environments());
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();
    settings.namespace = Some("sandbox".to_string());

    world
        .promoter(&settings)
        .run()
        .await
        .expect("promotion should succeed");

    let upgrades = world.chart.upgrades.lock();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].namespace, "sandbox");
    assert_eq!(upgrades[0].release, "sandbox-myapp");
    assert_eq!(*world.registry.ensured.lock(), vec!["sandbox"]);
}

/// Test: the GitOps path resolves the latest version, opens a pull request
/// on a latest-named branch and completes once the merge lands.
#[tokio::test]
async fn gitops_path_resolves_latest_and_lands() {
    let mut envs = mixed_environments();
    envs.push(environment(
        "staging-gitops",
        "app-staging",
        PromotionStrategy::Manual,
        EnvironmentKind::Permanent,
        500,
        Some("https://github.com/acme/environment-staging"),
    ));
    let world = World::new(envs);

    // Proposal mints pull request #1; let it merge green on first poll.
    world
        .provider
        .push_refresh(merged_pull_request(1, Some("merge-sha")));
    world.provider.push_statuses(vec![status(
        "https://ci.example.com/test",
        CommitState::Success,
    )]);

    let mut settings = mocks::test_config("myapp");
    settings.environment = Some("staging-gitops".to_string());

    let release = world
        .promoter(&settings)
        .run()
        .await
        .expect("promotion should succeed");

    let info = release.pull_request.expect("pull request handle");
    assert_eq!(info.pull_request.number, 1);
    assert_eq!(
        *world.provider.proposed_branches.lock(),
        vec!["promote-myapp-latest"]
    );
    // No explicit version: the resolver picked the greatest semver.
    assert_eq!(*world.provider.pinned_versions.lock(), vec!["1.2.0"]);
    // The direct updater never ran.
    assert!(world.chart.upgrades.lock().is_empty());

    let key = ActivityKey::derive("staging-gitops", settings.git_info.as_ref());
    let activity = world.recorder.get(&key).expect("record exists");
    assert_eq!(activity.pull_request.status, StepStatus::Succeeded);
    assert_eq!(activity.update.status, StepStatus::Succeeded);
    assert!(
        activity
            .pull_request
            .pull_request_url
            .as_deref()
            .is_some_and(|url| url.ends_with("/pull/1"))
    );
}

/// Test: a terminal poll failure marks the pull request step failed.
#[tokio::test]
async fn gitops_terminal_failure_marks_pull_request_failed() {
    let envs = vec![environment(
        "staging-gitops",
        "app-staging",
        PromotionStrategy::Manual,
        EnvironmentKind::Permanent,
        100,
        Some("https://github.com/acme/environment-staging"),
    )];
    let world = World::new(envs);

    let mut closed = open_pull_request(1);
    closed.closed = true;
    world.provider.push_refresh(closed);

    let mut settings = mocks::test_config("myapp");
    settings.version = "1.2.3".to_string();
    settings.environment = Some("staging-gitops".to_string());

    let err = world.promoter(&settings).run().await.unwrap_err();
    assert!(matches!(err, Error::PullRequestClosed(_)));

    let key = ActivityKey::derive("staging-gitops", settings.git_info.as_ref());
    let activity = world.recorder.get(&key).expect("record exists");
    assert_eq!(activity.pull_request.status, StepStatus::Failed);
}

// Diagnostics surface best-effort failures without failing the run.
#[tokio::test]
async fn best_effort_failures_become_diagnostics() {
    let world = World::new(mixed_environments());
    let mut settings = mocks::test_config("myapp");
    settings.version = "2.0.0".to_string();
    settings.environment = Some("qa".to_string());
    settings.git_info = None;

    let promoter = world.promoter(&settings);
    promoter.run().await.expect("promotion should succeed");

    // Without git metadata the notifier cannot comment; that is collected
    // as a warning, not an error.
    assert!(promoter.diagnostics().has_warnings());
    assert!(world.provider.comments.lock().is_empty());
}
