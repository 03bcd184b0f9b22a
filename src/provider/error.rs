// ABOUTME: Git provider error types with SNAFU pattern.
// ABOUTME: Unifies API, git subprocess and configuration failures for programmatic handling.

use snafu::Snafu;

use crate::chart::ChartError;

/// Unified provider error for API calls, git subprocesses and setup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("request to {url} failed: {source}"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("{url} returned {status}: {body}"))]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    #[snafu(display("failed to decode response from {url}: {source}"))]
    Decode { url: String, source: reqwest::Error },

    #[snafu(display("git {command} failed: {stderr}"))]
    Git { command: String, stderr: String },

    #[snafu(display("failed to run git: {source}"))]
    GitSpawn { source: std::io::Error },

    #[snafu(display("unsupported git repository url: {url}"))]
    UnsupportedUrl { url: String },

    #[snafu(display("missing access token for {host}; set GITHUB_TOKEN"))]
    MissingToken { host: String },

    #[snafu(display("manifest edit failed: {source}"))]
    Manifest { source: ChartError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The request never reached the provider or the response was unreadable.
    Network,
    /// The provider rejected the request.
    Api,
    /// A local git operation failed.
    Git,
    /// Missing or unusable provider configuration.
    Configuration,
    /// The manifest edit callback failed.
    Manifest,
}

impl ProviderError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Request { .. } | ProviderError::Decode { .. } => {
                ProviderErrorKind::Network
            }
            ProviderError::Api { .. } => ProviderErrorKind::Api,
            ProviderError::Git { .. } | ProviderError::GitSpawn { .. } => ProviderErrorKind::Git,
            ProviderError::UnsupportedUrl { .. } | ProviderError::MissingToken { .. } => {
                ProviderErrorKind::Configuration
            }
            ProviderError::Manifest { .. } => ProviderErrorKind::Manifest,
        }
    }
}

impl From<ChartError> for ProviderError {
    fn from(source: ChartError) -> Self {
        ProviderError::Manifest { source }
    }
}
