//! Tests for src/report/mod.rs - Rendered report structure

#[allow(dead_code)]
mod common {
    include!("../common/mod.rs");
}

use common::{create_mock_object, small_plan, FakeCloud, FakeCluster};
use dexdiag::collect::Collector;
use dexdiag::config::OutputFormat;
use dexdiag::context::{CloudPlatform, ClusterContext};
use dexdiag::report::{parse_rendered, SectionTag};

async fn collected_report() -> dexdiag::report::CollectionReport {
    let cluster = FakeCluster::new()
        .with_namespaces(&["dex-app-1a2b"])
        .with_listing("kube-system", "pods", vec![create_mock_object("coredns", "kube-system")])
        .with_failing_scope("monitoring");
    let cloud = FakeCloud::new().with_failing("describe-db-instances");
    let plan = small_plan(&["kube-system", "monitoring"]);
    let collector = Collector::new(&cluster, Some(&cloud), &plan);

    let context = ClusterContext {
        cluster_id: Some("cluster-1".to_string()),
        cloud_platform: Some(CloudPlatform::Aws),
        ..Default::default()
    };
    collector.status(&context).await
}

#[tokio::test]
async fn test_render_then_parse_preserves_sections() {
    let report = collected_report().await;

    for format in [OutputFormat::Wide, OutputFormat::Yaml, OutputFormat::Json] {
        let parsed = parse_rendered(&report.render(format));
        let labels: Vec<&str> = parsed.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, report.labels(), "format {:?}", format);

        let tags: Vec<SectionTag> = parsed.iter().map(|s| s.tag).collect();
        let expected: Vec<SectionTag> = report.sections.iter().map(|s| s.body.tag()).collect();
        assert_eq!(tags, expected);
    }
}

#[tokio::test]
async fn test_wide_listing_shows_names() {
    let report = collected_report().await;
    let parsed = parse_rendered(&report.render(OutputFormat::Wide));

    let pods = parsed
        .iter()
        .find(|s| s.label == "kube-system::pods")
        .unwrap();
    assert!(pods.body.contains("coredns"));

    let failed = parsed.iter().find(|s| s.label == "aws::rds").unwrap();
    assert_eq!(failed.tag, SectionTag::Error);
    assert!(failed.body.contains("AccessDenied"));
}

#[tokio::test]
async fn test_selector_labels_survive_round_trip() {
    let report = collected_report().await;
    let parsed = parse_rendered(&report.render(OutputFormat::Wide));

    assert!(parsed
        .iter()
        .any(|s| s.label == "dex-app-1a2b::pods[release=dex-app-1a2b]"));
}
