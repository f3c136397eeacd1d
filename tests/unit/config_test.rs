//! Tests for src/config/mod.rs and the collection plan built from it

use dexdiag::collect::CollectionPlan;
use dexdiag::config::{load_config, AppConfig};
use dexdiag::error::DiagError;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_default_plan_is_valid() {
    let plan = CollectionPlan::from_config(&AppConfig::default()).unwrap();

    assert_eq!(plan.system_namespaces.len(), 5);
    assert_eq!(plan.resource_kinds[0].plural, "pods");
    assert!(plan.tenants.matches("dex-app-1a2b"));
    assert_eq!(plan.instance_selector, "app.kubernetes.io/instance={tenant}");
}

#[test]
fn test_unknown_kind_rejected() {
    let config = AppConfig {
        tenant_kinds: vec!["pods".to_string(), "widgets".to_string()],
        ..Default::default()
    };
    let err = CollectionPlan::from_config(&config).unwrap_err();
    assert!(matches!(err, DiagError::Config(ref m) if m.contains("widgets")));
}

#[test]
fn test_kind_aliases_resolve() {
    let config = AppConfig {
        resource_kinds: vec!["po".to_string(), "svc".to_string(), "pvc".to_string()],
        ..Default::default()
    };
    let plan = CollectionPlan::from_config(&config).unwrap();
    let plurals: Vec<&str> = plan.resource_kinds.iter().map(|k| k.plural).collect();
    assert_eq!(plurals, vec!["pods", "services", "persistentvolumeclaims"]);
}

#[test]
fn test_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
system_namespaces = ["kube-system"]
resource_kinds = ["pods"]
tenant_prefix = "team-"
tenant_kinds = ["services"]
instance_selector = "app={{tenant}}"
app_selector = "owner={{tenant}}"
query_timeout_secs = 10
session_duration_secs = 900
session_name = "oncall"
credential_cache = "/tmp/dexdiag-creds.json"
"#
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.query_timeout(), Duration::from_secs(10));
    assert_eq!(config.session_duration_secs, 900);
    assert_eq!(
        config.credential_cache_path().unwrap(),
        std::path::PathBuf::from("/tmp/dexdiag-creds.json")
    );

    let plan = CollectionPlan::from_config(&config).unwrap();
    assert!(plan.tenants.matches("team-a1"));
    assert!(!plan.tenants.matches("dex-app-a1"));
    assert_eq!(plan.app_selector, "owner={tenant}");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "query_timeout_secs = \"soon\"").unwrap();
    assert!(matches!(
        load_config(Some(file.path())),
        Err(DiagError::Config(_))
    ));
}
