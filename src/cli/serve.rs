//! Serve command - Start MCP server

use anyhow::Result;
use clap::Args;

use crate::client::ClientContext;
use crate::config::ClientConfig;

/// Start MCP server for AI integration
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Build the client (and provision) before reading the first request
    #[arg(long)]
    pub eager: bool,
}

pub fn run(args: ServeArgs, config: ClientConfig) -> Result<()> {
    crate::mcp::run_mcp_server(ClientContext::new(config), args.eager)
}
