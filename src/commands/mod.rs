//! Command implementations

pub mod bundle;
pub mod logs;
pub mod status;

pub use bundle::*;
pub use logs::*;
pub use status::*;

use crate::auth::CredentialSet;
use crate::cli::Cli;
use crate::client::create_client;
use crate::collect::CollectionPlan;
use crate::config::{load_config, Settings};
use crate::error::Result;
use crate::query::cluster::KubeQueryClient;
use crate::query::CloudQuery;
use std::path::PathBuf;

/// Resolve CLI arguments and the config file into one settings object
pub fn settings_from_cli(cli: &Cli) -> Result<Settings> {
    let config = load_config(cli.config.as_deref())?;

    Ok(Settings {
        kubeconfig: cli.kubeconfig.clone().or_else(default_kubeconfig),
        context: cli.context.clone(),
        cluster_info: cli.cluster_info.clone(),
        role_arn: cli.role_arn.clone(),
        region: cli.region.clone(),
        profile: cli.profile.clone(),
        output: cli.output,
        config,
    })
}

/// First entry of `KUBECONFIG`, if set
fn default_kubeconfig() -> Option<PathBuf> {
    let value = std::env::var_os("KUBECONFIG")?;
    std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty())
}

/// Everything a collection command needs to talk to the cluster and cloud
pub struct Connection {
    pub plan: CollectionPlan,
    pub cluster: KubeQueryClient,
    pub cloud: Option<Box<dyn CloudQuery>>,
}

impl Connection {
    pub fn cloud(&self) -> Option<&dyn CloudQuery> {
        self.cloud.as_deref()
    }
}

/// Validate inputs, ensure a fresh session and build the query clients.
///
/// The connection target is checked first so a missing kubeconfig fails
/// before any credential exchange.
pub async fn connect(settings: &Settings) -> Result<Connection> {
    let target = settings.connection_target()?;
    let plan = CollectionPlan::from_config(&settings.config)?;

    let session = ensure_session(settings).await?;
    let timeout = settings.config.query_timeout();

    let client = create_client(target, settings.context.as_deref(), session.as_ref()).await?;
    let cluster = KubeQueryClient::new(client, timeout);
    let cloud = cloud_client(settings, session.as_ref()).await;

    Ok(Connection {
        plan,
        cluster,
        cloud,
    })
}

#[cfg(feature = "aws")]
async fn ensure_session(settings: &Settings) -> Result<Option<CredentialSet>> {
    use crate::auth::aws::StsExchange;
    use crate::auth::CredentialCache;

    if settings.role_arn.is_none() {
        return Ok(None);
    }
    let exchange = StsExchange::new(settings.region.as_deref(), settings.profile.as_deref()).await;
    let cache = CredentialCache::new(settings.config.credential_cache_path()?, Box::new(exchange))
        .with_session(
            settings.config.session_name.clone(),
            settings.config.session_duration_secs,
        )
        .with_timeout(settings.config.query_timeout());
    cache.ensure_valid_session(settings.role_arn.as_deref()).await
}

#[cfg(not(feature = "aws"))]
async fn ensure_session(settings: &Settings) -> Result<Option<CredentialSet>> {
    match &settings.role_arn {
        None => Ok(None),
        Some(role) => Err(crate::error::DiagError::Config(format!(
            "Cannot assume {}: built without the aws feature",
            role
        ))),
    }
}

#[cfg(feature = "aws")]
async fn cloud_client(
    settings: &Settings,
    session: Option<&CredentialSet>,
) -> Option<Box<dyn CloudQuery>> {
    use crate::query::aws::AwsCloudClient;

    let client = AwsCloudClient::new(
        session,
        settings.region.as_deref(),
        settings.profile.as_deref(),
        settings.config.query_timeout(),
    )
    .await;
    Some(Box::new(client))
}

#[cfg(not(feature = "aws"))]
async fn cloud_client(
    _settings: &Settings,
    _session: Option<&CredentialSet>,
) -> Option<Box<dyn CloudQuery>> {
    None
}
