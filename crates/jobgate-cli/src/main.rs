#![deny(unsafe_code)]

//! jobgate CLI: run the server and inspect its configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobgate_config::AppConfig;
use jobgate_core::{ScheduledJob, Server};

/// jobgate: credential-gated daemon listing and job scheduling over HTTP.
#[derive(Parser)]
#[command(name = "jobgate", version = jobgate_core::build_info::VERSION, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "jobgate.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration (passwords redacted).
        #[arg(long)]
        show: bool,
    },

    /// List the routes the configuration would register.
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, from_file) = load_config(&cli.config).await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose, &config))),
        )
        .init();

    if !from_file {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Serve => cmd_serve(config).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
        Commands::Routes => cmd_routes(config)?,
    }

    Ok(())
}

async fn cmd_serve(config: AppConfig) -> Result<()> {
    info!(version = %jobgate_core::build_info::version_string(), "Starting jobgate");

    let server = Server::new(config)?;
    if let Some(jobs) = server.take_job_receiver() {
        tokio::spawn(log_jobs(jobs));
    }
    server.run().await?;
    Ok(())
}

/// Stand-in execution backend: logs every accepted job.
async fn log_jobs(mut jobs: mpsc::Receiver<ScheduledJob>) {
    while let Some(job) = jobs.recv().await {
        info!(
            job_id = job.id,
            daemon = %job.request.daemon_target,
            version = job.request.version.as_deref().unwrap_or("*"),
            "job received"
        );
    }
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        println!("{}", render_config(config)?);
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

fn cmd_routes(config: AppConfig) -> Result<()> {
    let server = Server::new(config)?;
    let table = server.route_table()?;
    for (name, entry) in table.entries() {
        let guard = if entry.gate.is_some() { "basic" } else { "-" };
        println!("{:<6} {:<10} {:<22} {guard}", entry.method.as_str(), entry.path, name);
    }
    Ok(())
}

/// RUST_LOG wins, then `-v`, then `logging.level`.
fn log_filter(verbose: u8, config: &AppConfig) -> String {
    match verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn render_config(config: &AppConfig) -> Result<String> {
    let mut shown = config.clone();
    if !shown.feature.pass.is_empty() {
        shown.feature.pass = "[REDACTED]".to_string().into();
    }
    toml::to_string_pretty(&shown).context("failed to render configuration")
}

/// Returns the config and whether it came from `path`.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("invalid configuration in '{}'", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}
