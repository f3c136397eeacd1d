//! dexdiag - diagnostic collector for multi-tenant data-engineering clusters

use anyhow::Result;
use clap::Parser;
use dexdiag::cli::{Cli, Command};
use dexdiag::commands;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    setup_tracing(cli.verbose);

    // Handle color settings
    if cli.no_color {
        owo_colors::set_override(false);
    }

    if let Command::Completions(ref args) = cli.command {
        generate_completions(args.shell);
        return Ok(());
    }

    let result = match commands::settings_from_cli(&cli) {
        Ok(settings) => match cli.command {
            Command::Status => commands::run_status(&settings).await,
            Command::Logs(ref args) => {
                commands::run_logs(&settings, args.output_dir.as_deref()).await
            }
            Command::Bundle(ref args) => commands::run_bundle(&settings, &args.destination).await,
            Command::Completions(_) => Ok(()),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "dexdiag", &mut std::io::stdout());
}
