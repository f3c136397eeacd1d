//! Kubernetes API implementation of `ClusterQuery`

use super::{with_timeout, ClusterQuery, Listing, PodContainers, ResourceKind};
use crate::error::QueryError;
use async_trait::async_trait;
use futures::AsyncReadExt;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret};
use kube::api::{DynamicObject, ListParams, LogParams};
use kube::{Api, Client};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Label Helm v3 puts on its release secrets
const HELM_OWNER_SELECTOR: &str = "owner=helm";

/// `ClusterQuery` backed by a live kube client
#[derive(Clone)]
pub struct KubeQueryClient {
    client: Client,
    timeout: Duration,
}

impl KubeQueryClient {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

/// A 404 from the API server means the scope or kind does not exist
fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

fn list_params(selector: Option<&str>) -> ListParams {
    match selector {
        Some(s) if !s.is_empty() => ListParams::default().labels(s),
        _ => ListParams::default(),
    }
}

#[async_trait]
impl ClusterQuery for KubeQueryClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, QueryError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let op = "namespaces";

        let list = with_timeout(op, self.timeout, async {
            api.list(&ListParams::default())
                .await
                .map_err(|e| QueryError::kube(op, e))
        })
        .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_resources(
        &self,
        scope: &str,
        kind: &ResourceKind,
        selector: Option<&str>,
    ) -> Result<Listing, QueryError> {
        let ar = kind.api_resource();
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), scope, &ar);
        let op = format!("{}::{}", scope, kind.plural);
        let lp = list_params(selector);

        tracing::debug!(operation = %op, selector, "Listing resources");
        let list = with_timeout(&op, self.timeout, async {
            match api.list(&lp).await {
                Ok(list) => Ok(Some(list)),
                Err(e) if is_not_found(&e) => Ok(None),
                Err(e) => Err(QueryError::kube(&op, e)),
            }
        })
        .await?;

        let Some(list) = list else {
            return Ok(Listing::empty(kind.plural));
        };

        let items = list
            .items
            .into_iter()
            .map(|obj| {
                serde_json::to_value(obj).map_err(|e| QueryError::Malformed {
                    operation: op.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Listing {
            kind: kind.plural.to_string(),
            items,
        })
    }

    async fn list_releases(&self) -> Result<Listing, QueryError> {
        let api: Api<Secret> = Api::all(self.client.clone());
        let op = "helm::releases";

        let list = with_timeout(op, self.timeout, async {
            api.list_metadata(&ListParams::default().labels(HELM_OWNER_SELECTOR))
                .await
                .map_err(|e| QueryError::kube(op, e))
        })
        .await?;

        // Keep the latest revision of each release, like `helm ls`
        let mut latest: BTreeMap<(String, String), (u64, Value)> = BTreeMap::new();
        for secret in list.items {
            let namespace = secret.metadata.namespace.unwrap_or_default();
            let labels = secret.metadata.labels.unwrap_or_default();
            let Some(name) = labels.get("name").cloned() else {
                continue;
            };
            let revision: u64 = labels
                .get("version")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);

            let entry = json!({
                "metadata": {"name": name, "namespace": namespace},
                "revision": revision,
                "status": labels.get("status").cloned().unwrap_or_default(),
                "modifiedAt": labels.get("modifiedAt").cloned(),
            });

            let key = (namespace, name);
            match latest.get(&key) {
                Some((seen, _)) if *seen >= revision => {}
                _ => {
                    latest.insert(key, (revision, entry));
                }
            }
        }

        Ok(Listing {
            kind: "releases".to_string(),
            items: latest.into_values().map(|(_, v)| v).collect(),
        })
    }

    async fn list_pods(
        &self,
        scope: &str,
        selector: Option<&str>,
    ) -> Result<Vec<PodContainers>, QueryError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), scope);
        let op = format!("{}::pods", scope);
        let lp = list_params(selector);

        let pods = with_timeout(&op, self.timeout, async {
            match api.list(&lp).await {
                Ok(list) => Ok(list.items),
                Err(e) if is_not_found(&e) => Ok(Vec::new()),
                Err(e) => Err(QueryError::kube(&op, e)),
            }
        })
        .await?;

        Ok(pods.into_iter().map(pod_containers).collect())
    }

    async fn container_logs(
        &self,
        scope: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, QueryError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), scope);
        let op = format!("logs {}/{}/{}", scope, pod, container);
        let lp = LogParams {
            container: Some(container.to_string()),
            ..LogParams::default()
        };

        with_timeout(&op, self.timeout, async {
            let stream = api
                .log_stream(pod, &lp)
                .await
                .map_err(|e| QueryError::kube(&op, e))?;
            let mut stream = Box::pin(stream);
            let mut bytes = Vec::new();
            stream
                .read_to_end(&mut bytes)
                .await
                .map_err(|e| QueryError::kube(&op, e))?;
            Ok(bytes)
        })
        .await
    }
}

fn pod_containers(pod: Pod) -> PodContainers {
    let name = pod.metadata.name.unwrap_or_default();
    let Some(spec) = pod.spec else {
        return PodContainers {
            name,
            ..PodContainers::default()
        };
    };

    PodContainers {
        name,
        init_containers: spec
            .init_containers
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.name)
            .collect(),
        containers: spec.containers.into_iter().map(|c| c.name).collect(),
    }
}
