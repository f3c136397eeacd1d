//! Bundle command implementation

use super::connect;
use crate::bundle::Bundler;
use crate::collect::Collector;
use crate::config::Settings;
use crate::context::load_context;
use crate::error::{DiagError, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// Collect status and logs into `{destination}/dexdiag-bundle-*.tar.gz`
pub async fn run_bundle(settings: &Settings, destination: &Path) -> Result<()> {
    if !destination.is_dir() {
        return Err(DiagError::Bundle(format!(
            "Destination {} is not a directory",
            destination.display()
        )));
    }

    let connection = connect(settings).await?;
    let context = load_context(settings.cluster_info.as_deref())?;

    let collector = Collector::new(&connection.cluster, connection.cloud(), &connection.plan);
    let archive = Bundler::new(destination)
        .with_format(settings.output)
        .collect_bundle(&collector, &context)
        .await?;

    eprintln!("{} {}", "Bundle written:".green(), archive.display().bold());
    Ok(())
}
