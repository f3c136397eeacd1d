//! Tests for src/collect/mod.rs - Log collection

#[allow(dead_code)]
mod common {
    include!("../common/mod.rs");
}

use common::{create_mock_pod, small_plan, FakeCluster};
use dexdiag::collect::{log_path, Collector, LogSink};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Writer that keeps everything written to it
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_container_does_not_block_sibling() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = FakeCluster::new()
        .with_pods(
            "kube-system",
            None,
            vec![create_mock_pod("spark-driver", &[], &["worker", "sidecar"])],
        )
        .with_failing_log("kube-system", "spark-driver", "worker");
    let plan = small_plan(&["kube-system"]);
    let collector = Collector::new(&cluster, None, &plan);

    let mut sink = LogSink::directory(dir.path());
    let summary = collector.logs(&mut sink).await;

    let scope_dir = dir.path().join("kube-system");
    let sidecar = std::fs::read_to_string(log_path(&scope_dir, "spark-driver", "sidecar")).unwrap();
    assert_eq!(sidecar, "sidecar started\n");

    let worker = std::fs::read_to_string(log_path(&scope_dir, "spark-driver", "worker")).unwrap();
    assert!(worker.starts_with("ERROR: "));
    assert!(worker.contains("container not found"));

    assert_eq!(summary.units, 2);
    assert_eq!(summary.failures.len(), 1);
}

#[tokio::test]
async fn test_init_containers_fetched_first() {
    let cluster = FakeCluster::new().with_pods(
        "dex",
        None,
        vec![create_mock_pod("api-0", &["migrate"], &["api"])],
    );
    let plan = small_plan(&["dex"]);
    let collector = Collector::new(&cluster, None, &plan);

    let buffer = SharedBuffer::default();
    let mut sink = LogSink::Stream(Box::new(buffer.clone()));
    collector.logs(&mut sink).await;

    assert_eq!(
        buffer.contents(),
        "==> dex/api-0/migrate <==\nmigrate started\n==> dex/api-0/api <==\napi started\n"
    );
}

#[tokio::test]
async fn test_tenant_pods_deduplicated_across_selectors() {
    let shared = create_mock_pod("executor-1", &[], &["spark"]);
    let cluster = FakeCluster::new()
        .with_namespaces(&["dex-app-1a2b", "monitoring"])
        .with_pods(
            "dex-app-1a2b",
            Some("app.kubernetes.io/instance=dex-app-1a2b"),
            vec![shared.clone(), create_mock_pod("driver", &[], &["spark"])],
        )
        .with_pods(
            "dex-app-1a2b",
            Some("release=dex-app-1a2b"),
            vec![create_mock_pod("history", &[], &["server"]), shared],
        );
    let plan = small_plan(&[]);
    let collector = Collector::new(&cluster, None, &plan);

    let buffer = SharedBuffer::default();
    let mut sink = LogSink::Stream(Box::new(buffer.clone()));
    let summary = collector.logs(&mut sink).await;

    let headers: Vec<String> = buffer
        .contents()
        .lines()
        .filter(|l| l.starts_with("==> "))
        .map(String::from)
        .collect();
    assert_eq!(
        headers,
        vec![
            "==> dex-app-1a2b/executor-1/spark <==",
            "==> dex-app-1a2b/driver/spark <==",
            "==> dex-app-1a2b/history/server <==",
        ]
    );
    assert_eq!(summary.units, 3);
    assert!(summary.failures.is_empty());
}

#[tokio::test]
async fn test_pod_enumeration_failure_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = FakeCluster::new()
        .with_failing_pods("kube-system")
        .with_pods("dex", None, vec![create_mock_pod("api-0", &[], &["api"])]);
    let plan = small_plan(&["kube-system", "dex"]);
    let collector = Collector::new(&cluster, None, &plan);

    let mut sink = LogSink::directory(dir.path());
    let summary = collector.logs(&mut sink).await;

    assert_eq!(summary.units, 2);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].contains("kube-system::pods"));
    assert!(dir.path().join("dex").join("api-0_api.log").exists());
}

#[tokio::test]
async fn test_no_pods_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = FakeCluster::new();
    let plan = small_plan(&["kube-system"]);
    let collector = Collector::new(&cluster, None, &plan);

    let mut sink = LogSink::directory(dir.path().join("logs"));
    let summary = collector.logs(&mut sink).await;

    assert_eq!(summary.units, 0);
    assert!(!dir.path().join("logs").exists());
}

#[tokio::test]
async fn test_non_utf8_logs_are_kept_byte_for_byte() {
    let raw: &[u8] = b"line one\n\xff\xfe binary\nline three\n";
    let cluster = FakeCluster::new()
        .with_pods(
            "kube-system",
            None,
            vec![create_mock_pod("pod-a", &[], &["worker"])],
        )
        .with_log("kube-system", "pod-a", "worker", raw);
    let plan = small_plan(&["kube-system"]);
    let collector = Collector::new(&cluster, None, &plan);

    let dir = tempfile::tempdir().unwrap();
    let mut sink = LogSink::directory(dir.path());
    let summary = collector.logs(&mut sink).await;
    assert!(summary.failures.is_empty());

    let stored = std::fs::read(log_path(&dir.path().join("kube-system"), "pod-a", "worker")).unwrap();
    assert_eq!(stored, raw);

    let buffer = SharedBuffer::default();
    let mut sink = LogSink::Stream(Box::new(buffer.clone()));
    collector.logs(&mut sink).await;

    let mut expected = b"==> kube-system/pod-a/worker <==\n".to_vec();
    expected.extend_from_slice(raw);
    assert_eq!(buffer.bytes(), expected);
}
