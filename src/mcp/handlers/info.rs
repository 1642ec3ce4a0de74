//! Server-level tools: info and reset

use serde_json::{json, Value};

use super::{parse_args, ToolResult};
use crate::client::ChromaBackend;
use crate::mcp::state::ServerState;
use crate::mcp::tools::ResetTool;

pub fn do_get_server_info(state: &mut ServerState, _args: &Value) -> ToolResult {
    // Build first so the report below is populated
    let (heartbeat, version, collections) = {
        let client = state.client()?;
        (
            client.heartbeat().map_err(|e| e.to_string())?,
            client.version().ok(),
            client.count_collections().ok(),
        )
    };

    let config = state.context.config();
    let info = json!({
        "client_type": config.kind,
        "endpoint": config.kind.is_remote().then(|| config.base_url()),
        "tenant": config.tenant,
        "database": config.database,
        "embedding_function": config.embedding.function,
        "distance_metric": config.distance_metric,
        "allow_reset": config.allow_reset,
        "provisioning": state.context.report(),
        "heartbeat": heartbeat,
        "version": version,
        "collections": collections,
        "session_id": state.session_id,
    });

    serde_json::to_string_pretty(&info).map_err(|e| e.to_string())
}

pub fn do_reset(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: ResetTool = parse_args(args)?;
    if !tool_args.confirm {
        return Err("Reset deletes all data; call again with {\"confirm\": true}".to_string());
    }

    state.client()?.reset().map_err(|e| e.to_string())?;
    Ok("✓ Database reset".to_string())
}
