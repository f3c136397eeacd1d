//! Collection orchestrator
//!
//! Walks the fixed system namespaces and the discovered tenant namespaces,
//! strictly sequentially, and aggregates every query outcome. Individual
//! failures are recorded next to the successes rather than aborting the run.

pub mod aws;

use crate::config::AppConfig;
use crate::context::{CloudPlatform, ClusterContext};
use crate::error::{QueryError, Result};
use crate::query::registry::resolve_kinds;
use crate::query::{CloudQuery, ClusterQuery, PodContainers, ResourceKind};
use crate::report::{CollectionReport, SectionBody};
use crate::tenant::{discover_tenants, TenantMatcher};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The fixed iteration plan: which scopes and kinds to visit, in order
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub system_namespaces: Vec<String>,
    pub resource_kinds: Vec<&'static ResourceKind>,
    pub tenant_kinds: Vec<&'static ResourceKind>,
    pub tenants: TenantMatcher,
    pub instance_selector: String,
    pub app_selector: String,
}

impl CollectionPlan {
    /// Validate the configured plan; unknown kinds are rejected here,
    /// before any collection begins.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            system_namespaces: config.system_namespaces.clone(),
            resource_kinds: resolve_kinds(&config.resource_kinds)?,
            tenant_kinds: resolve_kinds(&config.tenant_kinds)?,
            tenants: TenantMatcher::new(&config.tenant_prefix)?,
            instance_selector: config.instance_selector.clone(),
            app_selector: config.app_selector.clone(),
        })
    }
}

/// Where per-container logs go
pub enum LogSink {
    /// One file per unit: `{dir}/{scope}/{pod}_{container}.log`
    Directory(PathBuf),
    /// Everything to one writer, each unit behind a header line
    Stream(Box<dyn Write + Send>),
}

impl LogSink {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        LogSink::Directory(path.into())
    }

    pub fn stdout() -> Self {
        LogSink::Stream(Box::new(std::io::stdout()))
    }

    fn emit(&mut self, scope: &str, pod: &str, container: &str, content: &[u8]) -> std::io::Result<()> {
        match self {
            LogSink::Directory(dir) => {
                let scope_dir = dir.join(scope);
                std::fs::create_dir_all(&scope_dir)?;
                std::fs::write(log_path(&scope_dir, pod, container), content)
            }
            LogSink::Stream(out) => {
                writeln!(out, "==> {}/{}/{} <==", scope, pod, container)?;
                out.write_all(content)?;
                if !content.ends_with(b"\n") {
                    writeln!(out)?;
                }
                out.flush()
            }
        }
    }
}

/// Artifact path for one log unit
pub fn log_path(scope_dir: &Path, pod: &str, container: &str) -> PathBuf {
    scope_dir.join(format!("{}_{}.log", pod, container))
}

/// Outcome of a Logs run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsSummary {
    /// Log units attempted (one per container)
    pub units: usize,
    /// Human-readable description of every failed unit or scope
    pub failures: Vec<String>,
}

/// Composes the query clients into the Status and Logs operations
pub struct Collector<'a> {
    cluster: &'a dyn ClusterQuery,
    cloud: Option<&'a dyn CloudQuery>,
    plan: &'a CollectionPlan,
}

impl<'a> Collector<'a> {
    pub fn new(
        cluster: &'a dyn ClusterQuery,
        cloud: Option<&'a dyn CloudQuery>,
        plan: &'a CollectionPlan,
    ) -> Self {
        Self {
            cluster,
            cloud,
            plan,
        }
    }

    /// Collect one structured snapshot.
    ///
    /// Order: cloud sections, release listing, system namespaces × kinds,
    /// then tenants × kinds × selector conventions.
    pub async fn status(&self, context: &ClusterContext) -> CollectionReport {
        let mut report = CollectionReport::new();

        self.collect_cloud(context, &mut report).await;

        report.push_listing("helm::releases", self.cluster.list_releases().await);

        for namespace in &self.plan.system_namespaces {
            for kind in &self.plan.resource_kinds {
                let result = self.cluster.list_resources(namespace, kind, None).await;
                report.push_listing(format!("{}::{}", namespace, kind.plural), result);
            }
        }

        let tenants = discover_tenants(self.cluster, &self.plan.tenants).await;
        for tenant in &tenants {
            let selectors = [
                tenant.selector(&self.plan.instance_selector),
                tenant.selector(&self.plan.app_selector),
            ];
            for kind in &self.plan.tenant_kinds {
                for selector in &selectors {
                    let result = self
                        .cluster
                        .list_resources(tenant.name(), kind, Some(selector))
                        .await;
                    report.push_listing(
                        format!("{}::{}[{}]", tenant, kind.plural, selector),
                        result,
                    );
                }
            }
        }

        tracing::info!(sections = report.sections.len(), "Status collection finished");
        report
    }

    async fn collect_cloud(&self, context: &ClusterContext, report: &mut CollectionReport) {
        let Some(cluster_id) = context.cluster_id() else {
            tracing::debug!("No cluster id, skipping cloud sections");
            return;
        };

        match &context.cloud_platform {
            Some(CloudPlatform::Aws) => match self.cloud {
                Some(cloud) => aws::collect_aws_status(cloud, context, report).await,
                None => report.push(
                    "cloud",
                    SectionBody::Info(format!(
                        "AWS cloud client unavailable; skipped cloud resources for {}",
                        cluster_id
                    )),
                ),
            },
            Some(CloudPlatform::Other(name)) => report.push(
                "cloud",
                SectionBody::Info(format!("Cloud platform '{}' is not supported", name)),
            ),
            None => report.push(
                "cloud",
                SectionBody::Info(format!(
                    "Cluster descriptor for {} has no cloud platform",
                    cluster_id
                )),
            ),
        }
    }

    /// Retrieve logs for every container of every pod in scope.
    ///
    /// Each (scope, pod, container) unit is independent: a failed fetch
    /// becomes that unit's content and never blocks the others.
    pub async fn logs(&self, sink: &mut LogSink) -> LogsSummary {
        let mut summary = LogsSummary::default();

        for namespace in &self.plan.system_namespaces {
            let pods = self.enumerate_pods(namespace, &[None], &mut summary).await;
            self.collect_scope_logs(namespace, &pods, sink, &mut summary).await;
        }

        let tenants = discover_tenants(self.cluster, &self.plan.tenants).await;
        for tenant in &tenants {
            let instance = tenant.selector(&self.plan.instance_selector);
            let app = tenant.selector(&self.plan.app_selector);
            let pods = self
                .enumerate_pods(
                    tenant.name(),
                    &[Some(instance.as_str()), Some(app.as_str())],
                    &mut summary,
                )
                .await;
            self.collect_scope_logs(tenant.name(), &pods, sink, &mut summary)
                .await;
        }

        tracing::info!(
            units = summary.units,
            failures = summary.failures.len(),
            "Log collection finished"
        );
        summary
    }

    /// Pods matched by any of `selectors`, de-duplicated in first-seen order
    async fn enumerate_pods(
        &self,
        scope: &str,
        selectors: &[Option<&str>],
        summary: &mut LogsSummary,
    ) -> Vec<PodContainers> {
        let mut seen = HashSet::new();
        let mut pods = Vec::new();

        for selector in selectors {
            match self.cluster.list_pods(scope, *selector).await {
                Ok(found) => {
                    for pod in found {
                        if seen.insert(pod.name.clone()) {
                            pods.push(pod);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(scope, error = %e, "Pod enumeration failed");
                    summary.units += 1;
                    summary.failures.push(e.to_string());
                }
            }
        }
        pods
    }

    async fn collect_scope_logs(
        &self,
        scope: &str,
        pods: &[PodContainers],
        sink: &mut LogSink,
        summary: &mut LogsSummary,
    ) {
        for pod in pods {
            for container in pod.all_containers() {
                summary.units += 1;
                let content = match self.cluster.container_logs(scope, &pod.name, container).await {
                    Ok(logs) => logs,
                    Err(e) => {
                        summary.failures.push(e.to_string());
                        failure_content(&e)
                    }
                };

                if let Err(e) = sink.emit(scope, &pod.name, container, &content) {
                    tracing::warn!(scope, pod = %pod.name, container, error = %e, "Failed to write logs");
                    summary
                        .failures
                        .push(format!("write {}/{}/{}: {}", scope, pod.name, container, e));
                }
            }
        }
    }
}

fn failure_content(err: &QueryError) -> Vec<u8> {
    format!("ERROR: {}\n", err).into_bytes()
}
