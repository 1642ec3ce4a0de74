//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::env::{vars, EnvOverlay, EnvSource};

pub mod collections;
pub mod config;
pub mod provision;
pub mod serve;
pub mod verify;

/// chroma-mcp - Chroma vector database access for AI assistants
///
/// Configuration comes from CHROMA_* environment variables, optionally
/// seeded from a .env file.
#[derive(Parser, Debug)]
#[command(name = "chroma-mcp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// .env file to load before resolving configuration (ignored if missing)
    #[arg(long, global = true, env = "CHROMA_DOTENV_PATH", default_value = ".env")]
    pub dotenv_path: PathBuf,

    /// Log filter (overrides RUST_LOG and LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio
    Serve(serve::ServeArgs),

    /// Show the resolved configuration
    Config(config::ConfigArgs),

    /// Create the configured tenant and database if missing
    Provision(provision::ProvisionArgs),

    /// Check the configured database is accessible
    Verify(verify::VerifyArgs),

    /// Manage collections
    Collections(collections::CollectionsArgs),
}

/// Client settings that take precedence over the matching CHROMA_* variable
#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    /// ephemeral, persistent, http or cloud
    #[arg(long, global = true, env = "CHROMA_CLIENT_TYPE")]
    pub client_type: Option<String>,

    /// Directory for the persistent client
    #[arg(long, global = true, env = "CHROMA_DATA_DIR")]
    pub data_dir: Option<String>,

    #[arg(long, global = true, env = "CHROMA_HOST")]
    pub host: Option<String>,

    #[arg(long, global = true, env = "CHROMA_PORT")]
    pub port: Option<String>,

    /// Use https (true/false)
    #[arg(long, global = true, env = "CHROMA_SSL")]
    pub ssl: Option<String>,

    #[arg(long, global = true, env = "CHROMA_TENANT")]
    pub tenant: Option<String>,

    #[arg(long, global = true, env = "CHROMA_DATABASE")]
    pub database: Option<String>,

    #[arg(long, global = true, env = "CHROMA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "CHROMA_EMBEDDING_FUNCTION")]
    pub embedding_function: Option<String>,

    /// auto, true or false
    #[arg(long, global = true, env = "CHROMA_CPU_EXECUTION_PROVIDER")]
    pub cpu_execution_provider: Option<String>,
}

impl ClientArgs {
    /// Layer the given flags over `base`. Values are still parsed and
    /// validated by configuration resolution.
    pub fn overlay<E: EnvSource>(&self, base: E) -> EnvOverlay<E> {
        EnvOverlay::new(base)
            .with(vars::CLIENT_TYPE, self.client_type.as_deref())
            .with(vars::DATA_DIR, self.data_dir.as_deref())
            .with(vars::HOST, self.host.as_deref())
            .with(vars::PORT, self.port.as_deref())
            .with(vars::SSL, self.ssl.as_deref())
            .with(vars::TENANT, self.tenant.as_deref())
            .with(vars::DATABASE, self.database.as_deref())
            .with(vars::API_KEY, self.api_key.as_deref())
            .with(vars::EMBEDDING_FUNCTION, self.embedding_function.as_deref())
            .with(vars::CPU_EXECUTION_PROVIDER, self.cpu_execution_provider.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, ClientKind};
    use std::collections::HashMap;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["chroma-mcp"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = parse(&["--client-type", "http", "--tenant", "flagged", "config"]);
        let env: HashMap<String, String> = [
            ("CHROMA_TENANT", "from-env"),
            ("CHROMA_DATABASE", "env-db"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = ClientConfig::resolve(&cli.client.overlay(&env)).unwrap();
        assert_eq!(config.kind, ClientKind::Http);
        assert_eq!(config.tenant, "flagged");
        assert_eq!(config.database, "env-db");
    }

    #[test]
    fn test_flag_values_are_validated() {
        let cli = parse(&["config", "--port", "eighty"]);
        let env: HashMap<String, String> = HashMap::new();
        assert!(ClientConfig::resolve(&cli.client.overlay(&env)).is_err());
    }

    #[test]
    fn test_log_level_flag() {
        let cli = parse(&["--log-level", "debug", "verify"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
