use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use active_files::condor::CondorClient;
use active_files::config::DiscoveryConfig;
use active_files::discovery::{DiscoveryResult, Driver};
use active_files::shutdown::install_shutdown_handler;
use active_files::token::{Htgettoken, SkipToken, TokenProvisioner};

#[derive(Parser, Debug)]
#[command(name = "active-files")]
#[command(version)]
#[command(about = "List storage files referenced by queued and running jobs, per group")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, short = 'c', env = "ACTIVE_FILES_CONFIG")]
    config: Option<PathBuf>,

    /// Group to discover (repeatable); replaces the configured groups
    #[arg(long = "group", short = 'g')]
    groups: Vec<String>,

    /// Scheduler eligibility constraint passed to the pool coordinator
    #[arg(long)]
    constraint: Option<String>,

    /// Abort the run after this many seconds
    #[arg(long, env = "ACTIVE_FILES_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Don't request bearer tokens before querying schedulers
    #[arg(long)]
    no_token: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Configuration
// =============================================================================

fn load_config(args: &Args) -> Result<DiscoveryConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => DiscoveryConfig::from_file(path)?,
        None => DiscoveryConfig::default(),
    };

    if !args.groups.is_empty() {
        config = config.with_groups(args.groups.clone());
    }
    if let Some(ref constraint) = args.constraint {
        config.schedd_constraint = constraint.clone();
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }
    if args.no_token {
        config.token.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// Output
// =============================================================================

fn print_result(
    result: &DiscoveryResult,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => {
            println!("Active files (collected {})", result.collected_at.to_rfc3339());
            println!("{}", "=".repeat(60));
            for (group, report) in &result.groups {
                println!(
                    "{:<10} {:<45} {} files",
                    group,
                    report.storage_area,
                    report.files.len()
                );
                println!("  {}", report.files);
            }
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&args)?;
    let cancel = install_shutdown_handler(config.timeout_secs.map(Duration::from_secs));

    let tokens: Arc<dyn TokenProvisioner> = if config.token.enabled {
        Arc::new(Htgettoken::from_config(&config.token))
    } else {
        Arc::new(SkipToken)
    };
    let query = Arc::new(CondorClient::from_config(&config));

    tracing::info!(
        groups = ?config.groups,
        constraint = %config.schedd_constraint,
        token = config.token.enabled,
        "Starting active file discovery"
    );

    let driver = Driver::new(config, query, tokens);
    match driver.run(&cancel).await {
        Ok(result) => print_result(&result, &args.output),
        Err(e) => {
            tracing::error!(error = %e, "Discovery failed");
            Err(e.into())
        }
    }
}
