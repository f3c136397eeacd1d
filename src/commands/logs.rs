//! Logs command implementation

use super::connect;
use crate::collect::{Collector, LogSink, LogsSummary};
use crate::config::Settings;
use crate::error::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Retrieve container logs into `output_dir`, or stream them to stdout
pub async fn run_logs(settings: &Settings, output_dir: Option<&Path>) -> Result<()> {
    let connection = connect(settings).await?;

    let mut sink = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            LogSink::directory(dir)
        }
        None => LogSink::stdout(),
    };

    let collector = Collector::new(&connection.cluster, connection.cloud(), &connection.plan);
    let summary = collector.logs(&mut sink).await;

    print_logs_summary(&summary, output_dir);
    Ok(())
}

fn print_logs_summary(summary: &LogsSummary, output_dir: Option<&Path>) {
    let units = format!("{} log units", summary.units);
    let failed = summary.failures.len();

    let outcome = if failed == 0 {
        "collected".green().to_string()
    } else {
        format!("collected, {} failed", failed).yellow().to_string()
    };
    match output_dir {
        Some(dir) => eprintln!("{} {} in {}", units.bold(), outcome, dir.display()),
        None => eprintln!("{} {}", units.bold(), outcome),
    }

    for failure in &summary.failures {
        eprintln!("  {}", failure.dimmed());
    }
}
