// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Promotion flags mirror the orchestrator's configuration.

use clap::Parser;
use std::time::Duration;

use proago::provider::ProviderKind;

// No #[command(version)]: the built-in --version flag would clash with the
// promotion's own --version option.
#[derive(Parser)]
#[command(name = "proago")]
#[command(about = "Promotes a version of an application to a deployment environment")]
pub struct Cli {
    /// The application to promote (discovered from the chart or git remote
    /// when omitted)
    pub app: Option<String>,

    /// The version to promote; defaults to the latest published version
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// The environment to promote to
    #[arg(short = 'e', long)]
    pub env: Option<String>,

    /// The namespace to promote to
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// The name of the release; defaults to "{namespace}-{app}"
    #[arg(long)]
    pub release: Option<String>,

    /// The name of the chart repository that contains the app
    #[arg(short = 'r', long, default_value = proago::config::DEFAULT_HELM_REPO_NAME)]
    pub helm_repo_name: String,

    /// The chart repository URL to use for the app
    #[arg(short = 'u', long, default_value = proago::config::DEFAULT_HELM_REPO_URL)]
    pub helm_repo_url: String,

    /// Promote to all automatic environments in order
    #[arg(long = "all-auto")]
    pub all_automatic: bool,

    /// How long to wait for the promotion to succeed
    #[arg(short = 't', long, default_value = "1h", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Poll time when waiting for a pull request to merge
    #[arg(long, default_value = "20s", value_parser = humantime::parse_duration)]
    pub pull_request_poll_time: Duration,

    /// Skip the chart repository index refresh if the local cache is known
    /// to be current
    #[arg(long)]
    pub no_helm_update: bool,

    /// Disable automatic merging of promotion pull requests
    #[arg(long)]
    pub no_merge: bool,

    /// Run non-interactively; confirmation prompts are declined
    #[arg(short = 'b', long)]
    pub batch: bool,

    /// The git hosting backend for pull requests and issues
    #[arg(long, value_enum, default_value = "github")]
    pub git_provider: ProviderKind,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}
