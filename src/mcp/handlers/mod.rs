//! MCP Tool handlers
//!
//! Each module handles a group of related tools.

pub mod collections;
pub mod info;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::state::ServerState;

/// Result type for tool handlers
pub type ToolResult = Result<String, String>;

/// Dispatch a tool call to the appropriate handler
pub fn dispatch_tool(state: &mut ServerState, name: &str, args: &Value) -> ToolResult {
    match name {
        "chroma_get_server_info" => info::do_get_server_info(state, args),
        "chroma_reset" => info::do_reset(state, args),

        "chroma_list_collections" => collections::do_list_collections(state, args),
        "chroma_create_collection" => collections::do_create_collection(state, args),
        "chroma_get_collection" => collections::do_get_collection(state, args),
        "chroma_delete_collection" => collections::do_delete_collection(state, args),

        _ => Err(format!("Unknown tool: {}", name)),
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, String> {
    serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))
}
