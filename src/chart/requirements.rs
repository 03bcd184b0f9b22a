// ABOUTME: The env/requirements.yaml manifest of a GitOps environment repository.
// ABOUTME: Lists chart dependencies pinned by name, version and repository.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ChartError;

/// Location of the requirements manifest inside an environment repository.
pub const REQUIREMENTS_FILE: &str = "env/requirements.yaml";

/// The dependency list of an environment's umbrella chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// One pinned chart dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Requirements {
    pub fn load(path: &Path) -> Result<Self, ChartError> {
        let content = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ChartError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ChartError> {
        let content = serde_yaml::to_string(self).map_err(|source| ChartError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pin `app` to `version` from `repository`, inserting the dependency if
    /// it is not yet listed. Matches on alias first, then name.
    pub fn set_app_version(&mut self, app: &str, version: &str, repository: &str) {
        for dep in &mut self.dependencies {
            let matches = dep.alias.as_deref() == Some(app) || dep.name == app;
            if matches {
                dep.version = version.to_string();
                dep.repository = Some(repository.to_string());
                return;
            }
        }
        self.dependencies.push(Dependency {
            name: app.to_string(),
            version: version.to_string(),
            repository: Some(repository.to_string()),
            alias: None,
        });
    }

    /// The pinned version of `app`, if listed.
    pub fn app_version(&self, app: &str) -> Option<&str> {
        self.dependencies
            .iter()
            .find(|dep| dep.alias.as_deref() == Some(app) || dep.name == app)
            .map(|dep| dep.version.as_str())
    }
}
