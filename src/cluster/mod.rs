// ABOUTME: Cluster-facing collaborator seams: environments, service URLs, release records.
// ABOUTME: Traits with file- and kubectl-backed default implementations.

mod environment;
mod kubectl;
mod locator;
mod registry;
mod releases;

pub use environment::{
    Environment, EnvironmentKind, EnvironmentSource, PromotionStrategy, sort_environments,
};
pub use kubectl::{Kubectl, KubectlError};
pub use locator::{KubectlLocator, LocatorError, ServiceLocator};
pub use registry::{
    ENVIRONMENTS_FILENAME, EnvironmentRegistry, FileRegistry, RegistryError,
};
pub use releases::{FileReleaseStore, IssueRef, ReleaseRecord, ReleaseStore, ReleaseStoreError};
