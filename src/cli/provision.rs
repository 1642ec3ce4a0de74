//! `chroma-mcp provision` command
//!
//! Run tenant/database provisioning once and show what happened. Failures
//! are reported, never fatal.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::client::ClientFactory;
use crate::config::ClientConfig;
use crate::provision::{ProvisioningOutcome, ProvisioningReport};

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ProvisionArgs, config: &ClientConfig) -> Result<()> {
    let report = ClientFactory::new().provision(config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(config, &report);
    Ok(())
}

fn print_report(config: &ClientConfig, report: &ProvisioningReport) {
    println!(
        "{} {} ({})",
        "Provisioning".bold(),
        config.base_url().cyan(),
        config.kind
    );
    println!(
        "  Tenant   {:<24} {}",
        report.tenant,
        styled(&report.tenant_outcome)
    );
    println!(
        "  Database {:<24} {}",
        report.database,
        styled(&report.database_outcome)
    );

    if report.has_failures() {
        println!(
            "\n{} Auto-provisioning did not fully succeed; the client will still use whatever exists on the server.",
            "⚠".yellow()
        );
    }
}

fn styled(outcome: &ProvisioningOutcome) -> colored::ColoredString {
    let text = outcome.to_string();
    match outcome {
        ProvisioningOutcome::Created => text.green(),
        ProvisioningOutcome::AlreadyExisted => text.normal(),
        ProvisioningOutcome::CreationFailed(_) => text.red(),
        ProvisioningOutcome::SkippedNonRemote | ProvisioningOutcome::SkippedDisabled => text.dimmed(),
    }
}
