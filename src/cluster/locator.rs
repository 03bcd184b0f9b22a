// ABOUTME: Service locator trait and kubectl-backed implementation.
// ABOUTME: Resolves externally reachable service URLs and ingress hostnames.

use async_trait::async_trait;

use super::kubectl::{Kubectl, KubectlError};

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error(transparent)]
    Kubectl(#[from] KubectlError),
}

/// Resolves how a deployed service can be reached from outside the cluster.
#[async_trait]
pub trait ServiceLocator: Send + Sync {
    /// The externally reachable URL of a service, if it has one.
    async fn service_url(&self, namespace: &str, name: &str)
    -> Result<Option<String>, LocatorError>;

    /// The first rule hostname of an ingress resource, if present.
    async fn ingress_host(&self, namespace: &str, name: &str)
    -> Result<Option<String>, LocatorError>;
}

/// Locator that reads services and ingresses through kubectl.
#[derive(Debug, Default)]
pub struct KubectlLocator {
    kubectl: Kubectl,
}

impl KubectlLocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceLocator for KubectlLocator {
    async fn service_url(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, LocatorError> {
        let Some(service) = self.kubectl.get_json(namespace, "service", name).await? else {
            return Ok(None);
        };
        Ok(load_balancer_url(&service))
    }

    async fn ingress_host(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, LocatorError> {
        let Some(ingress) = self.kubectl.get_json(namespace, "ingress", name).await? else {
            return Ok(None);
        };
        Ok(first_rule_host(&ingress))
    }
}

/// Extract `http://host[:port]` from a LoadBalancer service document.
fn load_balancer_url(service: &serde_json::Value) -> Option<String> {
    let ingress = service
        .pointer("/status/loadBalancer/ingress")?
        .as_array()?
        .first()?;
    let host = ingress
        .get("hostname")
        .or_else(|| ingress.get("ip"))?
        .as_str()?;

    let port = service
        .pointer("/spec/ports")
        .and_then(|p| p.as_array())
        .and_then(|p| p.first())
        .and_then(|p| p.get("port"))
        .and_then(|p| p.as_u64());

    Some(match port {
        Some(80) | None => format!("http://{host}"),
        Some(443) => format!("https://{host}"),
        Some(port) => format!("http://{host}:{port}"),
    })
}

/// Extract the first rule hostname from an ingress document.
fn first_rule_host(ingress: &serde_json::Value) -> Option<String> {
    ingress
        .pointer("/spec/rules")?
        .as_array()?
        .first()?
        .get("host")?
        .as_str()
        .filter(|h| !h.is_empty())
        .map(String::from)
}
