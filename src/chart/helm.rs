// ABOUTME: ChartClient implementation shelling out to the helm binary.
// ABOUTME: Repo registration, index refresh, version search and upgrade-or-install.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{ChartClient, ChartError};

/// Chart operations backed by the local `helm` CLI.
#[derive(Debug, Clone)]
pub struct HelmCli {
    binary: String,
}

impl Default for HelmCli {
    fn default() -> Self {
        Self::new()
    }
}

impl HelmCli {
    pub fn new() -> Self {
        Self {
            binary: "helm".to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ChartError> {
        debug!(command = %args.join(" "), "running helm");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|source| ChartError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ChartError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    name: String,
    version: String,
}

#[async_trait]
impl ChartClient for HelmCli {
    async fn ensure_repo(&self, alias: &str, url: &str) -> Result<(), ChartError> {
        // `repo list` fails on a fresh install with no repositories at all;
        // treat that the same as an empty list.
        let repos = match self.run(&["repo", "list", "-o", "json"]).await {
            Ok(out) => serde_json::from_str::<Vec<RepoEntry>>(&out)?,
            Err(ChartError::Command { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        if repos.iter().any(|repo| repo.name == alias) {
            return Ok(());
        }
        self.run(&["repo", "add", alias, url]).await?;
        Ok(())
    }

    async fn update_repos(&self) -> Result<(), ChartError> {
        self.run(&["repo", "update"]).await?;
        Ok(())
    }

    async fn search_versions(&self, app: &str) -> Result<Vec<String>, ChartError> {
        let out = self
            .run(&["search", "repo", app, "--versions", "-o", "json"])
            .await?;
        let entries: Vec<SearchEntry> = serde_json::from_str(&out)?;
        // Search matches on substrings; keep only exact chart name matches.
        Ok(entries
            .into_iter()
            .filter(|entry| {
                entry.name == app
                    || entry
                        .name
                        .rsplit_once('/')
                        .is_some_and(|(_, name)| name == app)
            })
            .map(|entry| entry.version)
            .collect())
    }

    async fn upgrade(
        &self,
        full_app: &str,
        release: &str,
        namespace: &str,
        version: Option<&str>,
    ) -> Result<(), ChartError> {
        let mut args = vec![
            "upgrade",
            "--install",
            release,
            full_app,
            "--namespace",
            namespace,
            "--create-namespace",
            "--wait",
        ];
        if let Some(version) = version {
            args.push("--version");
            args.push(version);
        }
        self.run(&args).await?;
        Ok(())
    }
}
