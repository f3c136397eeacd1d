//! Cluster context loaded from a cluster descriptor file

use crate::error::{DiagError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

/// Cloud platform hosting the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudPlatform {
    Aws,
    Other(String),
}

impl CloudPlatform {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "aws" | "amazon" => CloudPlatform::Aws,
            _ => CloudPlatform::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudPlatform::Aws => write!(f, "AWS"),
            CloudPlatform::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Cluster metadata used to parameterize cloud queries.
///
/// Every field is optional; an empty context simply disables cloud sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterContext {
    pub cluster_id: Option<String>,
    pub provisioner_id: Option<String>,
    pub log_location: Option<String>,
    pub cloud_platform: Option<CloudPlatform>,
}

impl ClusterContext {
    /// Cluster id, if present and non-empty
    pub fn cluster_id(&self) -> Option<&str> {
        self.cluster_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Tag owner used to find cluster load balancers
    pub fn provisioner_or_cluster_id(&self) -> Option<&str> {
        self.provisioner_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.cluster_id())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor {
    #[serde(default, alias = "cluster_id", deserialize_with = "scalar")]
    cluster_id: Option<String>,
    #[serde(default, alias = "provisioner_id", deserialize_with = "scalar")]
    provisioner_id: Option<String>,
    #[serde(default, alias = "log_location", deserialize_with = "scalar")]
    log_location: Option<String>,
    #[serde(default, alias = "cloud_platform", deserialize_with = "scalar")]
    cloud_platform: Option<String>,
    #[serde(default)]
    cluster: Option<Box<Descriptor>>,
}

/// Accept any scalar (`clusterId: 12345` is as valid as a string) and
/// stringify it; null maps to `None`.
fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar value, found {:?}",
            other
        ))),
    }
}

impl Descriptor {
    /// Top-level fields win; a nested `cluster` block fills the gaps
    fn flatten(mut self) -> Descriptor {
        let Some(inner) = self.cluster.take().map(|c| c.flatten()) else {
            return self;
        };
        Descriptor {
            cluster_id: self.cluster_id.or(inner.cluster_id),
            provisioner_id: self.provisioner_id.or(inner.provisioner_id),
            log_location: self.log_location.or(inner.log_location),
            cloud_platform: self.cloud_platform.or(inner.cloud_platform),
            cluster: None,
        }
    }
}

/// Load the cluster context.
///
/// No descriptor yields an empty context. Missing or null fields resolve to
/// `None`; only an unreadable file or invalid YAML/JSON is fatal.
pub fn load_context(path: Option<&Path>) -> Result<ClusterContext> {
    let Some(path) = path else {
        return Ok(ClusterContext::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        DiagError::Config(format!("Failed to read cluster descriptor {}: {e}", path.display()))
    })?;
    parse_context(&content)
}

/// Parse descriptor content (YAML or JSON)
pub fn parse_context(content: &str) -> Result<ClusterContext> {
    if content.trim().is_empty() {
        return Ok(ClusterContext::default());
    }

    let descriptor: Option<Descriptor> = serde_yaml::from_str(content)
        .map_err(|e| DiagError::Config(format!("Invalid cluster descriptor: {e}")))?;
    let descriptor = descriptor.unwrap_or_default().flatten();

    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    Ok(ClusterContext {
        cluster_id: non_empty(descriptor.cluster_id),
        provisioner_id: non_empty(descriptor.provisioner_id),
        log_location: non_empty(descriptor.log_location),
        cloud_platform: non_empty(descriptor.cloud_platform).map(|p| CloudPlatform::parse(&p)),
    })
}
