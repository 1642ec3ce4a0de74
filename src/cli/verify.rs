//! `chroma-mcp verify` command
//!
//! Exit status is non-zero when the configured database is not accessible.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use crate::client::ClientFactory;
use crate::config::ClientConfig;

#[derive(Args, Debug)]
pub struct VerifyArgs {}

pub fn run(_args: VerifyArgs, config: &ClientConfig) -> Result<()> {
    if !config.kind.is_remote() {
        println!(
            "{} {} client is in-process; nothing to verify",
            "✓".green(),
            config.kind
        );
        return Ok(());
    }

    let target = format!("{}/{}", config.tenant, config.database);
    if ClientFactory::new().verify_access(config) {
        println!("{} {} is accessible at {}", "✓".green(), target, config.base_url());
        Ok(())
    } else {
        bail!(
            "{} is not accessible at {} (check CHROMA_TENANT, CHROMA_DATABASE and CHROMA_API_KEY)",
            target,
            config.base_url()
        )
    }
}
