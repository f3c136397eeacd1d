//! Tenant (virtual cluster) namespace discovery

use crate::error::{DiagError, Result};
use crate::query::ClusterQuery;
use regex::Regex;
use std::fmt;

/// A discovered tenant namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantHandle(String);

impl TenantHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Expand a selector template, replacing `{tenant}` with this tenant's name
    pub fn selector(&self, template: &str) -> String {
        template.replace("{tenant}", &self.0)
    }
}

impl fmt::Display for TenantHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matches tenant namespace names: a fixed prefix followed by an
/// alphanumeric suffix
#[derive(Debug, Clone)]
pub struct TenantMatcher {
    pattern: Regex,
}

impl TenantMatcher {
    pub fn new(prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(DiagError::Config("tenant prefix must not be empty".to_string()));
        }
        let pattern = Regex::new(&format!("^{}[a-z0-9]+$", regex::escape(prefix)))
            .map_err(|e| DiagError::Config(format!("Invalid tenant prefix: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, namespace: &str) -> bool {
        self.pattern.is_match(namespace)
    }

    /// Filter a namespace listing down to tenants, keeping listing order
    pub fn filter<'a>(&self, namespaces: impl IntoIterator<Item = &'a str>) -> Vec<TenantHandle> {
        namespaces
            .into_iter()
            .filter(|ns| self.matches(ns))
            .map(|ns| TenantHandle(ns.to_string()))
            .collect()
    }
}

/// Discover tenants from the live namespace listing.
///
/// A failed listing degrades to no tenants; it never aborts a collection run.
pub async fn discover_tenants(
    source: &dyn ClusterQuery,
    matcher: &TenantMatcher,
) -> Vec<TenantHandle> {
    match source.list_namespaces().await {
        Ok(namespaces) => {
            let tenants = matcher.filter(namespaces.iter().map(String::as_str));
            tracing::info!(count = tenants.len(), "Discovered tenants");
            tenants
        }
        Err(e) => {
            tracing::warn!(error = %e, "Tenant discovery failed, skipping tenant sections");
            Vec::new()
        }
    }
}
