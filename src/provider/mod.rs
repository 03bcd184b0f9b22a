// ABOUTME: Git hosting provider seam: capability traits and backend selection.
// ABOUTME: One implementing variant per hosting backend, selected by configuration.

mod error;
pub mod github;
mod traits;

pub use error::{ProviderError, ProviderErrorKind};
pub use github::GitHubProvider;
pub use traits::*;

use clap::ValueEnum;

/// The full capability set a promotion needs from a Git provider.
pub trait GitProvider: PullRequestOps + CommitStatusOps + IssueOps {}

impl<T: PullRequestOps + CommitStatusOps + IssueOps + ?Sized> GitProvider for T {}

/// Which hosting backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderKind {
    #[default]
    Github,
}

/// Build the configured provider variant.
pub fn connect(kind: ProviderKind) -> Result<Box<dyn GitProvider>, ProviderError> {
    match kind {
        ProviderKind::Github => Ok(Box::new(GitHubProvider::from_env()?)),
    }
}
