//! `chroma-mcp config` command
//!
//! Print the configuration resolved from the environment, API key masked.
//!
//! # Usage
//! ```bash
//! chroma-mcp config                  # TOML
//! chroma-mcp config --format json
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Toml,
    Json,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

pub fn run(args: ConfigArgs, config: &ClientConfig) -> Result<()> {
    println!("{}", render(config, args.format)?);
    Ok(())
}

pub fn render(config: &ClientConfig, format: OutputFormat) -> Result<String> {
    let redacted = config.redacted();
    match format {
        OutputFormat::Toml => {
            toml::to_string_pretty(&redacted).context("Failed to render configuration as TOML")
        }
        OutputFormat::Json => serde_json::to_string_pretty(&redacted)
            .context("Failed to render configuration as JSON"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ClientConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::resolve(&env).unwrap()
    }

    #[test]
    fn test_render_json_masks_key() -> Result<()> {
        let cfg = config(&[
            ("CHROMA_CLIENT_TYPE", "http"),
            ("CHROMA_API_KEY", "supersecretvalue"),
        ]);
        let out = render(&cfg, OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&out)?;
        assert_eq!(value["kind"], "http");
        assert_eq!(value["api_key"], "supe****");
        assert!(!out.contains("supersecretvalue"));
        Ok(())
    }

    #[test]
    fn test_render_toml() -> Result<()> {
        let cfg = config(&[
            ("CHROMA_CLIENT_TYPE", "persistent"),
            ("CHROMA_COLLECTION_METADATA", r#"{"team": "search"}"#),
        ]);
        let out = render(&cfg, OutputFormat::Toml)?;
        assert!(out.contains("kind = \"persistent\""));
        assert!(out.contains("[provisioning]"));
        assert!(out.contains("team = \"search\""));
        Ok(())
    }

    #[test]
    fn test_render_toml_with_mixed_metadata() -> Result<()> {
        let cfg = config(&[(
            "CHROMA_COLLECTION_METADATA",
            r#"{"tags": ["a", "b"], "shards": 2, "public": false}"#,
        )]);
        let out = render(&cfg, OutputFormat::Toml)?;
        assert!(out.contains("shards = 2"));
        assert!(out.contains("public = false"));
        Ok(())
    }

    #[test]
    fn test_null_metadata_never_reaches_render() {
        let env: HashMap<String, String> =
            [("CHROMA_COLLECTION_METADATA".to_string(), r#"{"description": null}"#.to_string())]
                .into_iter()
                .collect();
        assert!(ClientConfig::resolve(&env).is_err());
    }
}
