//! Kubernetes client bootstrap

use crate::auth::CredentialSet;
use crate::error::{DiagError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::collections::HashMap;
use std::path::Path;

/// Create a Kubernetes client from an explicit kubeconfig file.
///
/// When a session is given its credentials are handed to every exec-based
/// auth plugin in the kubeconfig, so token helpers run as the assumed role.
pub async fn create_client(
    kubeconfig: &Path,
    context: Option<&str>,
    session: Option<&CredentialSet>,
) -> Result<Client> {
    let config = load_config(kubeconfig, context, session).await?;
    Client::try_from(config)
        .map_err(|e| DiagError::Config(format!("Failed to create Kubernetes client: {e}")))
}

async fn load_config(
    path: &Path,
    context: Option<&str>,
    session: Option<&CredentialSet>,
) -> Result<Config> {
    let mut kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        DiagError::Config(format!("Failed to read kubeconfig {}: {e}", path.display()))
    })?;

    if let Some(session) = session {
        inject_session_env(&mut kubeconfig, session);
    }

    let options = KubeConfigOptions {
        context: context.map(String::from),
        ..Default::default()
    };

    Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| DiagError::Config(format!("Failed to load kubeconfig: {e}")))
}

/// Set the session variables on every exec plugin, replacing existing ones
pub fn inject_session_env(kubeconfig: &mut Kubeconfig, session: &CredentialSet) {
    let vars = session.env_vars();

    for named in &mut kubeconfig.auth_infos {
        let Some(exec) = named
            .auth_info
            .as_mut()
            .and_then(|info| info.exec.as_mut())
        else {
            continue;
        };

        let env = exec.env.get_or_insert_with(Vec::new);
        env.retain(|entry| {
            !entry
                .get("name")
                .is_some_and(|name| vars.iter().any(|(key, _)| *key == name.as_str()))
        });
        for (key, value) in vars {
            env.push(HashMap::from([
                ("name".to_string(), key.to_string()),
                ("value".to_string(), value.to_string()),
            ]));
        }
        tracing::debug!(user = %named.name, "Injected session credentials into exec plugin");
    }
}
