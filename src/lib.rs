//! chroma-mcp - Chroma client provisioning and MCP access
//!
//! Resolves a client configuration from `CHROMA_*` environment variables,
//! makes sure the configured tenant and database exist on a remote server,
//! and hands out a single client handle.
//!
//! ## Key Concepts
//!
//! - **Client kinds**: ephemeral and persistent run in process; http and
//!   cloud talk to a Chroma server over `/api/v2`
//! - **Provisioning**: remote-http only, tenant before database, best effort
//! - **ClientContext**: owns the lazily built handle; passed explicitly

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod mcp;
pub mod provision;
pub mod remote;

pub use client::{ChromaBackend, ClientContext, ClientFactory, ClientHandle};
pub use config::ClientConfig;
pub use error::{ConfigError, Error};
pub use mcp::run_mcp_server;
pub use provision::{Provisioner, ProvisioningOutcome, ProvisioningReport};
