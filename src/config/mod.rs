//! Application configuration for dexdiag

use crate::error::{DiagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Collection plan and tunables stored in ~/.dexdiag/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Namespaces always collected, in order
    pub system_namespaces: Vec<String>,

    /// Resource kinds queried in every system namespace, in order
    pub resource_kinds: Vec<String>,

    /// Namespace prefix identifying tenant (virtual cluster) namespaces
    pub tenant_prefix: String,

    /// Resource kinds queried in every tenant namespace, in order
    pub tenant_kinds: Vec<String>,

    /// Generic instance-label selector; `{tenant}` is substituted
    pub instance_selector: String,

    /// Application-specific selector used by the scheduler workload
    pub app_selector: String,

    /// Timeout applied to every external call
    pub query_timeout_secs: u64,

    /// Lifetime requested for assumed-role sessions
    pub session_duration_secs: i32,

    /// Session name sent with the assume-role exchange
    pub session_name: String,

    /// Credential cache location, defaults to ~/.dexdiag/credentials.json
    pub credential_cache: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_namespaces: to_strings(&[
                "kube-system",
                "dex",
                "monitoring",
                "yunikorn",
                "ingress-nginx",
            ]),
            resource_kinds: to_strings(&[
                "pods",
                "deployments",
                "statefulsets",
                "daemonsets",
                "services",
                "ingresses",
                "persistentvolumeclaims",
                "jobs",
                "events",
            ]),
            tenant_prefix: "dex-app-".to_string(),
            tenant_kinds: to_strings(&[
                "pods",
                "deployments",
                "statefulsets",
                "services",
                "persistentvolumeclaims",
            ]),
            instance_selector: "app.kubernetes.io/instance={tenant}".to_string(),
            app_selector: "release={tenant}".to_string(),
            query_timeout_secs: 60,
            session_duration_secs: 3600,
            session_name: "dexdiag".to_string(),
            credential_cache: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl AppConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Resolved credential cache path
    pub fn credential_cache_path(&self) -> Result<PathBuf> {
        match &self.credential_cache {
            Some(path) => Ok(path.clone()),
            None => config_dir().map(|d| d.join("credentials.json")),
        }
    }
}

/// How cluster resource listings are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Wide,
    Yaml,
    Json,
}

/// Fully resolved inputs for one invocation.
///
/// Built once from CLI arguments and the config file, then handed to each
/// component constructor.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Kubeconfig file used to reach the cluster
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context
    pub context: Option<String>,
    /// Cluster descriptor file
    pub cluster_info: Option<PathBuf>,
    /// Role assumed before any authenticated call
    pub role_arn: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub output: OutputFormat,
    pub config: AppConfig,
}

impl Settings {
    /// The connection target, required by every collection command
    pub fn connection_target(&self) -> Result<&Path> {
        self.kubeconfig.as_deref().ok_or(DiagError::MissingTarget)
    }
}

/// Get the dexdiag config directory (~/.dexdiag)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".dexdiag"))
        .ok_or_else(|| DiagError::Config("Could not determine home directory".to_string()))
}

/// Load application config.
///
/// An explicit path must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = config_dir()?.join("config.toml");
            if !default.exists() {
                return Ok(AppConfig::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| DiagError::Config(format!("Failed to read {}: {e}", path.display())))?;
    toml::from_str(&content).map_err(|e| DiagError::Config(e.to_string()))
}
