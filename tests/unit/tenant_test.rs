//! Tests for src/tenant/mod.rs - Tenant discovery

#[allow(dead_code)]
mod common {
    include!("../common/mod.rs");
}

use common::FakeCluster;
use dexdiag::tenant::{discover_tenants, TenantHandle, TenantMatcher};

#[tokio::test]
async fn test_discovers_exactly_the_tenants() {
    let cluster = FakeCluster::new().with_namespaces(&[
        "dex-app-1a2b",
        "dex-app-3c4d",
        "monitoring",
        "kube-system",
    ]);
    let matcher = TenantMatcher::new("dex-app-").unwrap();

    let tenants = discover_tenants(&cluster, &matcher).await;

    assert_eq!(
        tenants,
        vec![TenantHandle::new("dex-app-1a2b"), TenantHandle::new("dex-app-3c4d")]
    );
}

#[tokio::test]
async fn test_listing_failure_yields_no_tenants() {
    let cluster = FakeCluster::new().with_failing_namespaces();
    let matcher = TenantMatcher::new("dex-app-").unwrap();

    assert!(discover_tenants(&cluster, &matcher).await.is_empty());
}

#[tokio::test]
async fn test_custom_prefix() {
    let cluster = FakeCluster::new().with_namespaces(&["dex-app-1a2b", "team-x9", "team-"]);
    let matcher = TenantMatcher::new("team-").unwrap();

    let tenants = discover_tenants(&cluster, &matcher).await;
    assert_eq!(tenants, vec![TenantHandle::new("team-x9")]);
}
