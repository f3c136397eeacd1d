//! Bundle packager
//!
//! Runs Status and Logs into a uniquely named working directory, archives
//! it as a single `.tar.gz` next to it and removes the directory.

use crate::collect::{Collector, LogSink, LogsSummary};
use crate::config::OutputFormat;
use crate::context::ClusterContext;
use crate::error::{DiagError, Result};
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Prefix of every bundle name
pub const BUNDLE_PREFIX: &str = "dexdiag-bundle-";

/// File inside the bundle holding the rendered Status report
pub const STATUS_FILE: &str = "status.out";

/// Directory inside the bundle holding per-container logs
pub const LOGS_DIR: &str = "logs";

/// Timestamped bundle name, e.g. `dexdiag-bundle-20260101120000`
pub fn bundle_name() -> String {
    format!("{}{}", BUNDLE_PREFIX, Utc::now().format("%Y%m%d%H%M%S"))
}

/// Packages one collection run into an archive under `destination`
#[derive(Debug, Clone)]
pub struct Bundler {
    destination: PathBuf,
    name: Option<String>,
    format: OutputFormat,
}

impl Bundler {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            name: None,
            format: OutputFormat::default(),
        }
    }

    /// Use a fixed bundle name instead of the timestamped one
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Collect, archive and clean up; returns the archive path.
    ///
    /// If archiving fails the working directory is kept for inspection and
    /// any partial archive is removed. If removing the working directory
    /// fails the archive is kept and the error is returned.
    pub async fn collect_bundle(&self, collector: &Collector<'_>, context: &ClusterContext) -> Result<PathBuf> {
        let name = self.name.clone().unwrap_or_else(bundle_name);
        let work_dir = self.destination.join(&name);
        let archive = self.destination.join(format!("{}.tar.gz", name));

        if work_dir.exists() {
            return Err(DiagError::Bundle(format!(
                "Bundle {} already exists in {}",
                name,
                self.destination.display()
            )));
        }
        fs::create_dir_all(&work_dir)?;
        tracing::info!(path = %work_dir.display(), "Collecting bundle");

        let report = collector.status(context).await;
        let mut sink = LogSink::directory(work_dir.join(LOGS_DIR));
        let summary = collector.logs(&mut sink).await;

        let mut status = report.render(self.format);
        status.push_str("--- diagnostics ---\n");
        status.push_str(&context_diagnostics(context));
        status.push_str(&report.diagnostics());
        status.push_str(&logs_diagnostics(&summary));
        fs::write(work_dir.join(STATUS_FILE), status)?;

        if let Err(e) = write_archive(&work_dir, &name, &archive) {
            tracing::warn!(path = %work_dir.display(), error = %e, "Archiving failed, keeping working directory");
            return Err(e);
        }

        fs::remove_dir_all(&work_dir).map_err(|e| {
            DiagError::Bundle(format!(
                "Archive written to {} but failed to remove {}: {}",
                archive.display(),
                work_dir.display(),
                e
            ))
        })?;

        tracing::info!(path = %archive.display(), "Bundle written");
        Ok(archive)
    }
}

/// Cluster descriptor fields the bundle was collected against
pub fn context_diagnostics(context: &ClusterContext) -> String {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    let mut output = String::new();
    let _ = writeln!(output, "Cluster id: {}", field(context.cluster_id()));
    let _ = writeln!(output, "Provisioner id: {}", field(context.provisioner_id.as_deref()));
    let _ = writeln!(
        output,
        "Cloud platform: {}",
        context
            .cloud_platform
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.to_string())
    );
    let _ = writeln!(output, "Log location: {}", field(context.log_location.as_deref()));
    output
}

/// Summary lines for a Logs run
pub fn logs_diagnostics(summary: &LogsSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Log units: {} ({} failed)",
        summary.units,
        summary.failures.len()
    );
    for failure in &summary.failures {
        let _ = writeln!(output, "  failed {}", failure);
    }
    output
}

/// Archive `work_dir` as `{name}/...` into a gzip-compressed tarball.
///
/// A partially written archive is removed before the error is returned.
fn write_archive(work_dir: &Path, name: &str, archive: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(archive)
        .map_err(|e| DiagError::Bundle(format!("Failed to create {}: {}", archive.display(), e)))?;

    let written = append_tree(file, work_dir, name);
    if let Err(e) = written {
        if let Err(rm) = fs::remove_file(archive) {
            tracing::warn!(path = %archive.display(), error = %rm, "Failed to remove partial archive");
        }
        return Err(DiagError::Bundle(format!(
            "Failed to write {}: {}",
            archive.display(),
            e
        )));
    }
    Ok(())
}

fn append_tree(file: File, work_dir: &Path, name: &str) -> std::io::Result<()> {
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(name, work_dir)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?.sync_all()
}
