//! Resource kind registry for dynamic listing

use crate::error::{DiagError, Result};
use kube::api::{ApiResource, GroupVersionKind};
use std::collections::HashMap;
use std::sync::LazyLock;

/// A listable namespaced resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub kind: &'static str,
    pub group: &'static str,
    pub version: &'static str,
    pub plural: &'static str,
    pub aliases: &'static [&'static str],
}

impl ResourceKind {
    /// Dynamic API descriptor for this kind
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(self.group, self.version, self.kind);
        ApiResource::from_gvk_with_plural(&gvk, self.plural)
    }
}

const fn kind(
    kind: &'static str,
    group: &'static str,
    version: &'static str,
    plural: &'static str,
    aliases: &'static [&'static str],
) -> ResourceKind {
    ResourceKind {
        kind,
        group,
        version,
        plural,
        aliases,
    }
}

/// Every kind the collector knows how to list
pub static RESOURCE_KINDS: &[ResourceKind] = &[
    kind("Pod", "", "v1", "pods", &["po", "pod"]),
    kind("Service", "", "v1", "services", &["svc", "service"]),
    kind("ConfigMap", "", "v1", "configmaps", &["cm", "configmap"]),
    kind("PersistentVolumeClaim", "", "v1", "persistentvolumeclaims", &["pvc"]),
    kind("ServiceAccount", "", "v1", "serviceaccounts", &["sa"]),
    kind("Event", "", "v1", "events", &["ev", "event"]),
    kind("Deployment", "apps", "v1", "deployments", &["deploy", "deployment"]),
    kind("StatefulSet", "apps", "v1", "statefulsets", &["sts", "statefulset"]),
    kind("DaemonSet", "apps", "v1", "daemonsets", &["ds", "daemonset"]),
    kind("ReplicaSet", "apps", "v1", "replicasets", &["rs", "replicaset"]),
    kind("Job", "batch", "v1", "jobs", &["job"]),
    kind("CronJob", "batch", "v1", "cronjobs", &["cj", "cronjob"]),
    kind("Ingress", "networking.k8s.io", "v1", "ingresses", &["ing", "ingress"]),
    kind(
        "HorizontalPodAutoscaler",
        "autoscaling",
        "v2",
        "horizontalpodautoscalers",
        &["hpa"],
    ),
];

static BY_NAME: LazyLock<HashMap<String, &'static ResourceKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for info in RESOURCE_KINDS {
        map.insert(info.plural.to_string(), info);
        map.insert(info.kind.to_lowercase(), info);
        for alias in info.aliases {
            map.insert(alias.to_string(), info);
        }
    }
    map
});

/// Look up a kind by plural, kind name or alias
pub fn lookup(name: &str) -> Option<&'static ResourceKind> {
    BY_NAME.get(&name.trim().to_lowercase()).copied()
}

/// Resolve a configured kind list, rejecting unknown names up front
pub fn resolve_kinds(names: &[String]) -> Result<Vec<&'static ResourceKind>> {
    names
        .iter()
        .map(|name| {
            lookup(name)
                .ok_or_else(|| DiagError::Config(format!("Unknown resource kind: {name}")))
        })
        .collect()
}
