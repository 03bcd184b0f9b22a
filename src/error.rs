// ABOUTME: Application-wide error types for proago.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::time::Duration;
use thiserror::Error;

use crate::activity::ActivityError;
use crate::chart::ChartError;
use crate::cluster::RegistryError;
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not find an environment called {name}; possible values: {}", known.join(", "))]
    UnknownEnvironment { name: String, known: Vec<String> },

    #[error("no environments have been configured yet; declare them in proago.yml")]
    NoEnvironments,

    #[error("environment {0} does not have a namespace associated with it")]
    NoNamespace(String),

    #[error("could not discover the application name ({0}); pass it explicitly")]
    AppDiscovery(String),

    #[error("could not find a version of app {0} in the chart repositories")]
    NoVersions(String),

    #[error("environment {name} has no usable source repository url: {url}")]
    InvalidSourceUrl { name: String, url: String },

    #[error("promotion failed as pull request {0} is closed without merging")]
    PullRequestClosed(String),

    #[error("commit status {state} for {target_url}: {description}")]
    CommitStatusFailed {
        state: String,
        target_url: String,
        description: String,
    },

    #[error("pull request {url} last commit {sha} has status {status}")]
    LastCommitFailed {
        url: String,
        sha: String,
        status: String,
    },

    #[error("timed out waiting for pull request {url} to merge; waited {}", humantime::format_duration(*timeout))]
    PromotionTimeout { url: String, timeout: Duration },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
