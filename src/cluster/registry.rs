// ABOUTME: Environment registry trait and the proago.yml file-backed implementation.
// ABOUTME: Environments are declared in a discovered config file; namespaces are ensured via kubectl.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::environment::Environment;
use super::kubectl::{Kubectl, KubectlError};

pub const ENVIRONMENTS_FILENAME: &str = "proago.yml";
pub const ENVIRONMENTS_FILENAME_ALT: &str = "proago.yaml";
pub const ENVIRONMENTS_FILENAME_DIR: &str = ".proago/config.yml";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("environment file not found in {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid environment file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Kubectl(#[from] KubectlError),
}

/// Read access to the environments a team promotes into.
#[async_trait]
pub trait EnvironmentRegistry: Send + Sync {
    /// Every declared environment, in file order.
    async fn environments(&self) -> Result<Vec<Environment>, RegistryError>;

    /// Look up a single environment by name.
    async fn environment(&self, name: &str) -> Result<Option<Environment>, RegistryError> {
        Ok(self
            .environments()
            .await?
            .into_iter()
            .find(|env| env.name == name))
    }

    /// The caller's current namespace, used when no target is given.
    async fn current_namespace(&self) -> Result<String, RegistryError>;

    /// Create the namespace if it does not already exist.
    async fn ensure_namespace(&self, namespace: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Deserialize)]
struct EnvironmentsFile {
    #[serde(default)]
    environments: Vec<Environment>,
}

/// Registry backed by a `proago.yml` file next to the promoted application.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    kubectl: Kubectl,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kubectl: Kubectl::new(),
        }
    }

    /// Find the environments file in the given directory.
    pub fn discover(dir: &Path) -> Result<Self, RegistryError> {
        let candidates = [
            dir.join(ENVIRONMENTS_FILENAME),
            dir.join(ENVIRONMENTS_FILENAME_ALT),
            dir.join(ENVIRONMENTS_FILENAME_DIR),
        ];

        for path in candidates {
            if path.exists() {
                return Ok(Self::new(path));
            }
        }

        Err(RegistryError::NotFound(dir.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<EnvironmentsFile, RegistryError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[async_trait]
impl EnvironmentRegistry for FileRegistry {
    async fn environments(&self) -> Result<Vec<Environment>, RegistryError> {
        Ok(self.load()?.environments)
    }

    async fn current_namespace(&self) -> Result<String, RegistryError> {
        Ok(self.kubectl.current_namespace().await?)
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<(), RegistryError> {
        Ok(self.kubectl.ensure_namespace(namespace).await?)
    }
}
