// Common test utilities and helpers

use async_trait::async_trait;
use dexdiag::collect::CollectionPlan;
use dexdiag::config::AppConfig;
use dexdiag::error::QueryError;
use dexdiag::query::{CloudQuery, ClusterQuery, Listing, PodContainers, ResourceKind};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Plan with a small, fixed set of namespaces and kinds
pub fn small_plan(system_namespaces: &[&str]) -> CollectionPlan {
    let config = AppConfig {
        system_namespaces: system_namespaces.iter().map(|s| s.to_string()).collect(),
        resource_kinds: vec!["pods".to_string(), "services".to_string()],
        tenant_kinds: vec!["pods".to_string()],
        ..Default::default()
    };
    CollectionPlan::from_config(&config).unwrap()
}

/// Create a pod with the given init and main containers
pub fn create_mock_pod(name: &str, init: &[&str], containers: &[&str]) -> PodContainers {
    PodContainers {
        name: name.to_string(),
        init_containers: init.iter().map(|s| s.to_string()).collect(),
        containers: containers.iter().map(|s| s.to_string()).collect(),
    }
}

/// Create a raw object as it would appear in a listing
pub fn create_mock_object(name: &str, namespace: &str) -> Value {
    json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "creationTimestamp": "2026-01-01T00:00:00Z",
        }
    })
}

/// In-memory cluster that answers from fixtures and records every call.
///
/// Unknown scopes and kinds answer with empty listings; logs default to one
/// line naming the container.
#[derive(Default)]
pub struct FakeCluster {
    namespaces: Option<Vec<String>>,
    namespaces_fail: bool,
    listings: HashMap<(String, String), Vec<Value>>,
    failing_scopes: HashSet<String>,
    pods: HashMap<(String, Option<String>), Vec<PodContainers>>,
    failing_pod_scopes: HashSet<String>,
    failing_logs: HashSet<(String, String, String)>,
    logs: HashMap<(String, String, String), Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespaces(mut self, names: &[&str]) -> Self {
        self.namespaces = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_failing_namespaces(mut self) -> Self {
        self.namespaces_fail = true;
        self
    }

    pub fn with_listing(mut self, scope: &str, plural: &str, items: Vec<Value>) -> Self {
        self.listings
            .insert((scope.to_string(), plural.to_string()), items);
        self
    }

    pub fn with_failing_scope(mut self, scope: &str) -> Self {
        self.failing_scopes.insert(scope.to_string());
        self
    }

    pub fn with_pods(mut self, scope: &str, selector: Option<&str>, pods: Vec<PodContainers>) -> Self {
        self.pods
            .insert((scope.to_string(), selector.map(String::from)), pods);
        self
    }

    pub fn with_failing_pods(mut self, scope: &str) -> Self {
        self.failing_pod_scopes.insert(scope.to_string());
        self
    }

    pub fn with_failing_log(mut self, scope: &str, pod: &str, container: &str) -> Self {
        self.failing_logs
            .insert((scope.to_string(), pod.to_string(), container.to_string()));
        self
    }

    pub fn with_log(mut self, scope: &str, pod: &str, container: &str, bytes: &[u8]) -> Self {
        self.logs.insert(
            (scope.to_string(), pod.to_string(), container.to_string()),
            bytes.to_vec(),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ClusterQuery for FakeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, QueryError> {
        self.record("namespaces".to_string());
        if self.namespaces_fail {
            return Err(QueryError::kube("namespaces", "forbidden"));
        }
        Ok(self.namespaces.clone().unwrap_or_default())
    }

    async fn list_resources(
        &self,
        scope: &str,
        kind: &ResourceKind,
        selector: Option<&str>,
    ) -> Result<Listing, QueryError> {
        let op = format!("{}::{}", scope, kind.plural);
        self.record(match selector {
            Some(s) => format!("{}[{}]", op, s),
            None => op.clone(),
        });
        if self.failing_scopes.contains(scope) {
            return Err(QueryError::kube(op, "forbidden"));
        }
        let items = self
            .listings
            .get(&(scope.to_string(), kind.plural.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Listing {
            kind: kind.plural.to_string(),
            items,
        })
    }

    async fn list_releases(&self) -> Result<Listing, QueryError> {
        self.record("helm::releases".to_string());
        Ok(Listing::empty("releases"))
    }

    async fn list_pods(
        &self,
        scope: &str,
        selector: Option<&str>,
    ) -> Result<Vec<PodContainers>, QueryError> {
        self.record(format!("pods {} {:?}", scope, selector));
        if self.failing_pod_scopes.contains(scope) {
            return Err(QueryError::kube(format!("{}::pods", scope), "forbidden"));
        }
        Ok(self
            .pods
            .get(&(scope.to_string(), selector.map(String::from)))
            .cloned()
            .unwrap_or_default())
    }

    async fn container_logs(
        &self,
        scope: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, QueryError> {
        let op = format!("logs {}/{}/{}", scope, pod, container);
        self.record(op.clone());
        let key = (scope.to_string(), pod.to_string(), container.to_string());
        if self.failing_logs.contains(&key) {
            return Err(QueryError::kube(op, "container not found"));
        }
        if let Some(bytes) = self.logs.get(&key) {
            return Ok(bytes.clone());
        }
        Ok(format!("{} started\n", container).into_bytes())
    }
}

/// Cloud fake answering every operation with a small document
#[derive(Default)]
pub struct FakeCloud {
    failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudQuery for FakeCloud {
    async fn query(&self, service: &str, operation: &str, params: &Value) -> Result<Value, QueryError> {
        let op = format!("{}:{}", service, operation);
        self.calls.lock().unwrap().push(op.clone());
        if self.failing.contains(operation) {
            return Err(QueryError::cloud(op, "AccessDenied"));
        }
        Ok(match operation {
            "describe-load-balancers" => json!({"loadBalancers": []}),
            _ => json!({"operation": op, "params": params}),
        })
    }
}

/// Check if a kubeconfig is available for live-cluster tests
pub fn has_kubeconfig() -> bool {
    std::env::var_os("KUBECONFIG").is_some()
        || dirs::home_dir()
            .map(|h| h.join(".kube").join("config").exists())
            .unwrap_or(false)
}
