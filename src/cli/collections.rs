//! `chroma-mcp collections` command
//!
//! # Usage
//! ```bash
//! chroma-mcp collections list --limit 20
//! chroma-mcp collections create docs --metadata '{"team": "search"}'
//! chroma-mcp collections get docs
//! chroma-mcp collections delete docs
//! ```

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::client::{ChromaBackend, ClientContext};
use crate::config::ClientConfig;

#[derive(Args, Debug)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub command: CollectionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum CollectionsCommands {
    /// List collections
    List {
        /// Maximum number to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Create a collection (no-op if it exists)
    Create {
        name: String,

        /// Extra metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Show a collection's id and metadata
    Get { name: String },

    /// Delete a collection
    Delete { name: String },
}

pub fn execute(args: CollectionsArgs, config: ClientConfig) -> Result<()> {
    let mut context = ClientContext::new(config);
    let client = context.client()?;

    match args.command {
        CollectionsCommands::List { limit, offset } => {
            let collections = client.list_collections(limit, offset)?;
            if collections.is_empty() {
                println!("No collections.");
            }
            for c in collections {
                println!("{}  {}", c.name.bold(), c.id.dimmed());
            }
        }
        CollectionsCommands::Create { name, metadata } => {
            let metadata = metadata.as_deref().map(parse_metadata).transpose()?;
            let collection = client.create_collection(&name, metadata)?;
            println!("{} {} ({})", "✓".green(), collection.name, collection.id);
        }
        CollectionsCommands::Get { name } => {
            let collection = client.get_collection(&name)?;
            println!("{}", serde_json::to_string_pretty(&collection)?);
        }
        CollectionsCommands::Delete { name } => {
            client.delete_collection(&name)?;
            println!("{} Deleted {}", "✓".green(), name);
        }
    }
    Ok(())
}

fn parse_metadata(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("--metadata is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--metadata must be a JSON object"),
    }
}
