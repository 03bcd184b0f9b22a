// ABOUTME: Durable promotion activity records and their pure transitions.
// ABOUTME: Records hold a pull request step and an update step per promotion.

mod key;
mod recorder;

pub use key::ActivityKey;
pub use recorder::{ActivityRecorder, FileRecorder, MemoryRecorder, Transition};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid activity ledger: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress of one promotion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Succeeded | StepStatus::Failed)
    }
}

/// A commit status as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusEntry {
    pub url: String,
    pub status: String,
}

/// The pull-request half of a GitOps promotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestStep {
    #[serde(default)]
    pub status: StepStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit_sha: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// The release-update half of a promotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStep {
    #[serde(default)]
    pub status: StepStatus,

    #[serde(default)]
    pub statuses: Vec<GitStatusEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One promotion's durable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionActivity {
    pub name: String,
    pub pipeline: String,
    pub build: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,

    pub environment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,

    #[serde(default)]
    pub pull_request: PullRequestStep,

    #[serde(default)]
    pub update: UpdateStep,

    pub created_at: DateTime<Utc>,
}

impl PromotionActivity {
    pub fn new(key: &ActivityKey) -> Self {
        Self {
            name: key.name().to_string(),
            pipeline: key.pipeline.clone(),
            build: key.build.clone(),
            build_url: key.build_url.clone(),
            environment: key.environment.clone(),
            version: None,
            application_url: None,
            pull_request: PullRequestStep::default(),
            update: UpdateStep::default(),
            created_at: Utc::now(),
        }
    }
}

// Transitions are pure record-to-record functions applied through
// `ActivityRecorder::apply`. Each is idempotent: a second application of the
// same transition leaves the record unchanged.

pub fn start_pull_request(mut activity: PromotionActivity) -> PromotionActivity {
    if activity.pull_request.status == StepStatus::Pending {
        activity.pull_request.status = StepStatus::Running;
        activity.pull_request.started_at = Some(Utc::now());
    }
    activity
}

pub fn complete_pull_request(mut activity: PromotionActivity) -> PromotionActivity {
    if !activity.pull_request.status.is_terminal() {
        activity.pull_request.status = StepStatus::Succeeded;
        activity.pull_request.completed_at = Some(Utc::now());
    }
    activity
}

pub fn fail_pull_request(mut activity: PromotionActivity) -> PromotionActivity {
    if !activity.pull_request.status.is_terminal() {
        activity.pull_request.status = StepStatus::Failed;
        activity.pull_request.completed_at = Some(Utc::now());
    }
    activity
}

pub fn start_update(mut activity: PromotionActivity) -> PromotionActivity {
    if activity.update.status == StepStatus::Pending {
        activity.update.status = StepStatus::Running;
        activity.update.started_at = Some(Utc::now());
    }
    activity
}

pub fn complete_update(mut activity: PromotionActivity) -> PromotionActivity {
    if !activity.update.status.is_terminal() {
        activity.update.status = StepStatus::Succeeded;
        activity.update.completed_at = Some(Utc::now());
    }
    activity
}

pub fn fail_update(mut activity: PromotionActivity) -> PromotionActivity {
    if !activity.update.status.is_terminal() {
        activity.update.status = StepStatus::Failed;
        activity.update.completed_at = Some(Utc::now());
    }
    activity
}
