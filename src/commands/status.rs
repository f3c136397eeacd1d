//! Status command implementation

use super::connect;
use crate::collect::Collector;
use crate::config::Settings;
use crate::context::load_context;
use crate::error::Result;
use crate::report::{CollectionReport, SectionTag};
use owo_colors::OwoColorize;

/// Collect one snapshot and print it to stdout
pub async fn run_status(settings: &Settings) -> Result<()> {
    let connection = connect(settings).await?;
    let context = load_context(settings.cluster_info.as_deref())?;

    let collector = Collector::new(&connection.cluster, connection.cloud(), &connection.plan);
    let report = collector.status(&context).await;

    print!("{}", report.render(settings.output));
    print_status_summary(&report);
    Ok(())
}

/// One colored summary line on stderr, followed by each failed section
fn print_status_summary(report: &CollectionReport) {
    let errors = report.count(SectionTag::Error);
    let sections = format!("{} sections", report.sections.len());

    if errors == 0 {
        eprintln!("{} {}", sections.bold(), "collected without errors".green());
        return;
    }

    eprintln!(
        "{} {}",
        sections.bold(),
        format!("{} failed", errors).yellow()
    );
    for (label, err) in report.errors() {
        eprintln!("  {} {}", label.red(), err.to_string().dimmed());
    }
}
