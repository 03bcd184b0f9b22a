// ABOUTME: Composable capability traits for Git hosting providers.
// ABOUTME: Defines PullRequestOps, CommitStatusOps and IssueOps.

mod issues;
mod pull_request;
mod status;
mod shared_types;

pub use issues::IssueOps;
pub use pull_request::{PullRequestOps, RequirementsEdit};
pub use status::CommitStatusOps;
pub use shared_types::*;
