//! CLI command definitions using clap

pub use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dexdiag",
    version,
    about = "Collect diagnostics from a multi-tenant data-engineering cluster",
    long_about = None,
)]
pub struct Cli {
    /// Kubeconfig file used to reach the cluster
    #[arg(long, global = true, env = "DEXDIAG_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true, env = "DEXDIAG_CONTEXT")]
    pub context: Option<String>,

    /// Cluster descriptor file (cluster id, provisioner id, cloud platform)
    #[arg(long, global = true, env = "DEXDIAG_CLUSTER_INFO")]
    pub cluster_info: Option<PathBuf>,

    /// Role to assume before any authenticated call
    #[arg(long, global = true, env = "DEXDIAG_ROLE_ARN")]
    pub role_arn: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS shared-config profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Listing format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "wide")]
    pub output: OutputFormat,

    /// Config file (default: ~/.dexdiag/config.toml)
    #[arg(long, global = true, env = "DEXDIAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a structured snapshot of cloud and cluster resources
    Status,

    /// Retrieve logs of every container in system and tenant namespaces
    Logs(LogsArgs),

    /// Collect status and logs into a single .tar.gz archive
    Bundle(BundleArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Write one file per container here instead of streaming to stdout
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Directory the archive is written to
    pub destination: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
