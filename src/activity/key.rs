// ABOUTME: Activity record keys derived from CI environment context and git metadata.
// ABOUTME: The sanitized name is stable for the lifetime of one invocation.

use tracing::warn;

use crate::gitinfo::GitInfo;
use crate::types::ResourceName;

/// Identifies the durable record for one promotion.
///
/// Two promotions deriving the same name collapse onto the same record;
/// updates are last-writer-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityKey {
    name: ResourceName,
    pub pipeline: String,
    pub build: String,
    pub build_url: Option<String>,
    pub environment: String,
}

impl ActivityKey {
    pub fn new(
        pipeline: impl Into<String>,
        build: impl Into<String>,
        build_url: Option<String>,
        environment: impl Into<String>,
    ) -> Self {
        let pipeline = pipeline.into();
        let build = build.into();
        let raw = if build.is_empty() {
            pipeline.clone()
        } else {
            format!("{pipeline}-{build}")
        };
        Self {
            name: ResourceName::sanitize(&raw),
            pipeline,
            build,
            build_url,
            environment: environment.into(),
        }
    }

    /// Derive the key for a promotion into `environment`.
    ///
    /// The pipeline name comes from `$JOB_NAME`, falling back to the git
    /// remote as `org/name/branch` (branch from `$BRANCH_NAME`, defaulting
    /// to `master`). Build number and URL come from `$BUILD_NUMBER` and
    /// `$BUILD_URL`.
    pub fn derive(environment: &str, git: Option<&GitInfo>) -> Self {
        let mut pipeline = env_var("JOB_NAME");
        let build = env_var("BUILD_NUMBER");
        let build_url = {
            let url = env_var("BUILD_URL");
            if url.is_empty() { None } else { Some(url) }
        };

        if pipeline.is_empty() {
            if let Some(git) = git {
                let branch = {
                    let branch = env_var("BRANCH_NAME");
                    if branch.is_empty() {
                        "master".to_string()
                    } else {
                        branch
                    }
                };
                pipeline = format!("{}/{}/{}", git.organisation, git.name, branch);
            } else {
                warn!(
                    "no $JOB_NAME and no git repository metadata; \
                     promotion activities will be recorded under a local key"
                );
                pipeline = "local".to_string();
            }
        }

        Self::new(pipeline, build, build_url, environment)
    }

    /// The sanitized record name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

fn env_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
