//! Typed query clients for the cluster API and the cloud provider API
//!
//! The collection orchestrator only talks to these traits, so tests can swap
//! in deterministic fakes for live infrastructure.

#[cfg(feature = "aws")]
pub mod aws;
pub mod cluster;
pub mod registry;

pub use registry::{ResourceKind, RESOURCE_KINDS};

use crate::error::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Result of listing one resource kind in one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Plural kind name, e.g. "pods"
    pub kind: String,
    /// Raw objects as returned by the API
    pub items: Vec<Value>,
}

impl Listing {
    pub fn empty(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the listed objects, in listing order
    pub fn names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
            .collect()
    }
}

/// A pod and its containers, in pod spec order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodContainers {
    pub name: String,
    pub init_containers: Vec<String>,
    pub containers: Vec<String>,
}

impl PodContainers {
    /// Init containers followed by main containers
    pub fn all_containers(&self) -> impl Iterator<Item = &str> {
        self.init_containers
            .iter()
            .chain(self.containers.iter())
            .map(String::as_str)
    }
}

/// Queries against the cluster-orchestration API.
///
/// A missing scope or kind is an empty listing, never an error.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// Names of all namespaces visible to the current credentials
    async fn list_namespaces(&self) -> Result<Vec<String>, QueryError>;

    /// List `kind` in `scope`, optionally filtered by a label selector
    async fn list_resources(
        &self,
        scope: &str,
        kind: &ResourceKind,
        selector: Option<&str>,
    ) -> Result<Listing, QueryError>;

    /// Helm-style release listing across all namespaces
    async fn list_releases(&self) -> Result<Listing, QueryError>;

    /// Pods in `scope` with their init and main containers
    async fn list_pods(
        &self,
        scope: &str,
        selector: Option<&str>,
    ) -> Result<Vec<PodContainers>, QueryError>;

    /// Raw log bytes of exactly one container, passed through undecoded
    async fn container_logs(
        &self,
        scope: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, QueryError>;
}

/// Queries against the cloud-provider API, e.g. `("eks", "describe-cluster")`
#[async_trait]
pub trait CloudQuery: Send + Sync {
    async fn query(&self, service: &str, operation: &str, params: &Value)
        -> Result<Value, QueryError>;
}

/// Bound an external call by `after`, reporting expiry as a `QueryError::Timeout`
pub async fn with_timeout<T, F>(operation: &str, after: Duration, fut: F) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, "Query timed out");
            Err(QueryError::Timeout {
                operation: operation.to_string(),
                after,
            })
        }
    }
}
