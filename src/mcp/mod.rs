//! MCP (Model Context Protocol) Server
//!
//! Exposes the configured Chroma client via MCP tools for AI integration.
//!
//! # Tools
//! - `chroma_get_server_info` - Resolved config, provisioning outcome, heartbeat
//! - `chroma_list_collections` - List collections
//! - `chroma_create_collection` - Get-or-create a collection
//! - `chroma_get_collection` - Collection id and metadata
//! - `chroma_delete_collection` - Delete a collection
//! - `chroma_reset` - Reset the database (when allowed)

mod handlers;
mod jsonrpc;
mod server;
mod state;
mod tools;

pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse};
pub use server::{run_mcp_server, ChromaMcpServer};
pub use state::ServerState;
