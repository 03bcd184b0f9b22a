// ABOUTME: Thin wrapper around the kubectl binary.
// ABOUTME: Namespace management, current-context lookup and JSON resource reads.

use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum KubectlError {
    #[error("failed to run kubectl: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("kubectl {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("failed to parse kubectl output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Handle on the local kubectl binary.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}

impl Kubectl {
    pub fn new() -> Self {
        Self {
            binary: "kubectl".to_string(),
        }
    }

    /// The namespace of the current kubectl context, or `default`.
    pub async fn current_namespace(&self) -> Result<String, KubectlError> {
        let out = self
            .run(&[
                "config",
                "view",
                "--minify",
                "--output",
                "jsonpath={..namespace}",
            ])
            .await?;
        let ns = out.trim();
        if ns.is_empty() {
            Ok("default".to_string())
        } else {
            Ok(ns.to_string())
        }
    }

    /// Create the namespace if it does not already exist.
    pub async fn ensure_namespace(&self, namespace: &str) -> Result<(), KubectlError> {
        if self.run(&["get", "namespace", namespace]).await.is_ok() {
            return Ok(());
        }
        self.run(&["create", "namespace", namespace]).await?;
        Ok(())
    }

    /// Fetch a namespaced resource as JSON, `None` when it does not exist.
    pub async fn get_json(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<Option<serde_json::Value>, KubectlError> {
        let args = ["get", kind, name, "--namespace", namespace, "-o", "json"];
        match self.run(&args).await {
            Ok(out) => Ok(Some(serde_json::from_str(&out)?)),
            Err(KubectlError::Command { stderr, .. }) if stderr.contains("NotFound") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, KubectlError> {
        let output = Command::new(&self.binary).args(args).output().await?;
        if !output.status.success() {
            return Err(KubectlError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
