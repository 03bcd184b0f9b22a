// ABOUTME: Promotion orchestration: coordinator, paths, poller and notifier.
// ABOUTME: Exports the Promoter entry point and the per-promotion release state.

mod coordinator;
mod notifier;
mod poller;
mod pull_request;
mod release;
mod updater;

pub use coordinator::Promoter;
pub use notifier::IssueNotifier;
pub use poller::{MergeStatusPoller, PollState};
pub use pull_request::PullRequestPromoter;
pub use release::{PullRequestInfo, ReleaseInfo};
pub use updater::ReleaseUpdater;
