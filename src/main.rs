//! chroma-mcp CLI - Entry point
//!
//! Usage: chroma-mcp <command> [options]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chroma_mcp::cli::{Cli, Commands};
use chroma_mcp::config::env::ProcessEnv;
use chroma_mcp::config::{load_dotenv, ClientConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before tracing, so LOG_LEVEL / RUST_LOG from the file apply
    let dotenv_loaded = load_dotenv(&cli.dotenv_path)?;

    init_tracing(cli.log_level.as_deref());
    if dotenv_loaded {
        tracing::debug!("Loaded environment from {}", cli.dotenv_path.display());
    }

    let config = ClientConfig::resolve(&cli.client.overlay(ProcessEnv))
        .context("Invalid Chroma configuration")?;

    match cli.command {
        Commands::Serve(args) => chroma_mcp::cli::serve::run(args, config),
        Commands::Config(args) => chroma_mcp::cli::config::run(args, &config),
        Commands::Provision(args) => chroma_mcp::cli::provision::run(args, &config),
        Commands::Verify(args) => chroma_mcp::cli::verify::run(args, &config),
        Commands::Collections(args) => chroma_mcp::cli::collections::execute(args, config),
    }
}

/// Logs go to stderr; stdout carries MCP traffic and command output.
/// Filter: `--log-level`, then RUST_LOG, then LOG_LEVEL, then info.
fn init_tracing(log_level: Option<&str>) {
    let filter = log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
