//! Collection tools: list, create, get, delete

use serde_json::{json, Value};

use super::{parse_args, ToolResult};
use crate::client::ChromaBackend;
use crate::mcp::state::ServerState;
use crate::mcp::tools::{CollectionNameTool, CreateCollectionTool, ListCollectionsTool};
use crate::remote::Collection;

fn describe(collection: &Collection) -> Value {
    json!({
        "id": collection.id,
        "name": collection.name,
        "metadata": collection.metadata,
    })
}

pub fn do_list_collections(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: ListCollectionsTool = if args.is_null() {
        ListCollectionsTool::default()
    } else {
        parse_args(args)?
    };

    let client = state.client()?;
    let collections = client
        .list_collections(tool_args.limit, tool_args.offset)
        .map_err(|e| e.to_string())?;

    if collections.is_empty() {
        return Ok("No collections found.".to_string());
    }

    let mut result = format!("Found {} collection(s):\n\n", collections.len());
    for collection in &collections {
        match collection.metadata {
            Some(ref meta) if !meta.is_empty() => {
                result.push_str(&format!("- {} {}\n", collection.name, Value::Object(meta.clone())));
            }
            _ => result.push_str(&format!("- {}\n", collection.name)),
        }
    }
    Ok(result)
}

pub fn do_create_collection(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: CreateCollectionTool = parse_args(args)?;

    let client = state.client()?;
    let collection = client
        .create_collection(&tool_args.collection_name, tool_args.metadata)
        .map_err(|e| e.to_string())?;

    Ok(format!(
        "✓ Collection '{}' ready (id: {})\n\n{}",
        collection.name,
        collection.id,
        pretty(&describe(&collection))
    ))
}

pub fn do_get_collection(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: CollectionNameTool = parse_args(args)?;

    let client = state.client()?;
    let collection = client
        .get_collection(&tool_args.collection_name)
        .map_err(|e| e.to_string())?;

    Ok(pretty(&describe(&collection)))
}

pub fn do_delete_collection(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: CollectionNameTool = parse_args(args)?;

    let client = state.client()?;
    client
        .delete_collection(&tool_args.collection_name)
        .map_err(|e| e.to_string())?;

    Ok(format!("✓ Deleted collection '{}'", tool_args.collection_name))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
