// ABOUTME: Environment definitions: deployment targets with a namespace, strategy and kind.
// ABOUTME: Deserialized from proago.yml; the orchestrator only reads them.

use serde::{Deserialize, Serialize};

/// A named deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,

    pub namespace: String,

    /// Human-facing label used in issue comments. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub strategy: PromotionStrategy,

    #[serde(default)]
    pub kind: EnvironmentKind,

    /// GitOps manifest repository for this environment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EnvironmentSource>,

    /// Position in the automatic promotion sequence (ascending).
    #[serde(default)]
    pub order: i32,
}

/// Where an environment's GitOps manifests live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSource {
    pub url: String,

    /// Base branch promotion pull requests target. Defaults to `master`.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
}

/// How a version reaches an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionStrategy {
    /// Requires explicit confirmation.
    #[default]
    Manual,
    /// Promoted without confirmation as part of an all-automatic sweep.
    Automatic,
}

/// What sort of environment this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    #[default]
    Permanent,
    Preview,
    Development,
}

impl EnvironmentKind {
    pub fn is_permanent(&self) -> bool {
        matches!(self, EnvironmentKind::Permanent)
    }
}

impl Environment {
    /// The label shown to humans, falling back to the environment name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether promotion to this environment goes through a GitOps pull
    /// request instead of a direct release upgrade.
    pub fn uses_gitops(&self) -> bool {
        self.kind.is_permanent()
            && self
                .source
                .as_ref()
                .is_some_and(|source| !source.url.is_empty())
    }

    /// The base branch promotion pull requests should target.
    pub fn base_ref(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|source| source.base_ref.as_deref())
            .unwrap_or("master")
    }
}

/// Sort environments into promotion order: ascending `order`, then name for
/// a stable tie-break.
pub fn sort_environments(environments: &mut [Environment]) {
    environments.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
}
