//! Tests for src/context/mod.rs - Cluster descriptor loading

use dexdiag::context::{load_context, CloudPlatform, ClusterContext};
use dexdiag::error::DiagError;
use std::io::Write;

fn descriptor(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_no_path_is_empty_context() {
    assert_eq!(load_context(None).unwrap(), ClusterContext::default());
}

#[test]
fn test_yaml_descriptor() {
    let file = descriptor(
        "clusterId: cluster-1\nprovisionerId: liftie-abc\ncloudPlatform: AWS\nlogLocation: s3://logs/cluster-1\n",
    );
    let context = load_context(Some(file.path())).unwrap();

    assert_eq!(context.cluster_id(), Some("cluster-1"));
    assert_eq!(context.provisioner_or_cluster_id(), Some("liftie-abc"));
    assert_eq!(context.cloud_platform, Some(CloudPlatform::Aws));
    assert_eq!(context.log_location.as_deref(), Some("s3://logs/cluster-1"));
}

#[test]
fn test_json_descriptor_with_missing_fields() {
    let file = descriptor(r#"{"cluster_id": "cluster-2", "cloudPlatform": null}"#);
    let context = load_context(Some(file.path())).unwrap();

    assert_eq!(context.cluster_id(), Some("cluster-2"));
    assert_eq!(context.provisioner_or_cluster_id(), Some("cluster-2"));
    assert!(context.cloud_platform.is_none());
}

#[test]
fn test_nested_cluster_block() {
    let file = descriptor("cluster:\n  clusterId: inner\n  cloudPlatform: azure\n");
    let context = load_context(Some(file.path())).unwrap();

    assert_eq!(context.cluster_id(), Some("inner"));
    assert_eq!(
        context.cloud_platform,
        Some(CloudPlatform::Other("azure".to_string()))
    );
}

#[test]
fn test_unreadable_descriptor_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_context(Some(&dir.path().join("missing.yaml"))).unwrap_err();
    assert!(matches!(err, DiagError::Config(_)));
}

#[test]
fn test_invalid_descriptor_is_config_error() {
    let file = descriptor("clusterId: [unterminated");
    assert!(matches!(
        load_context(Some(file.path())),
        Err(DiagError::Config(_))
    ));
}
