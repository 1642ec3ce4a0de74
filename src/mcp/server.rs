//! MCP Server implementation
//!
//! Implements the Model Context Protocol (JSON-RPC 2.0) server directly
//! without external SDK dependencies. One request per line on stdin, one
//! response per line on stdout; logs go to stderr.

use std::io::{BufRead, BufReader, Write};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::handlers::dispatch_tool;
use super::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::state::ServerState;
use super::tools::tool_definitions;
use crate::client::ClientContext;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server handler
pub struct ChromaMcpServer {
    state: ServerState,
}

impl ChromaMcpServer {
    pub fn new(context: ClientContext) -> Self {
        Self {
            state: ServerState::new(context),
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Build the client now instead of on the first tool call
    pub fn warm_up(&mut self) -> anyhow::Result<()> {
        self.state.context.client()?;
        Ok(())
    }

    /// Handle a JSON-RPC request
    pub fn handle_request(&mut self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            match request.method.as_str() {
                "notifications/initialized" => {
                    self.state.initialized = true;
                    info!("MCP client initialized ({})", self.state.session_id);
                }
                "notifications/cancelled" => debug!("MCP request cancelled"),
                other => debug!("Ignoring notification: {}", other),
            }
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        if let Err(failure) = request.check_version() {
            return Some(JsonRpcResponse::reply(id, Err(failure)));
        }

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_call_tool(&request.params),
            "ping" => Ok(json!({})),
            _ => Err((METHOD_NOT_FOUND, format!("Method not found: {}", request.method))),
        };

        Some(JsonRpcResponse::reply(id, result))
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": "chroma-mcp",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Chroma vector database access. Use chroma_get_server_info to see which tenant and database are in use, chroma_list_collections to explore, chroma_create_collection to add one."
        })
    }

    fn handle_call_tool(&mut self, params: &Value) -> Result<Value, (i64, String)> {
        let name = params["name"]
            .as_str()
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
        let arguments = &params["arguments"];

        debug!("Tool call: {}", name);
        match dispatch_tool(&mut self.state, name, arguments) {
            Ok(text) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            })),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                Ok(json!({
                    "content": [{
                        "type": "text",
                        "text": format!("Error: {}", e)
                    }],
                    "isError": true
                }))
            }
        }
    }

    /// Serve line-delimited JSON-RPC until the reader is exhausted
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> anyhow::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            debug!("MCP received: {}", truncate(&line, 200));

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(&request),
                Err(e) => Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                debug!("MCP sending: {}", truncate(&json, 200));
                writeln!(writer, "{}", json)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Run the MCP server with STDIO transport
pub fn run_mcp_server(context: ClientContext, eager: bool) -> anyhow::Result<()> {
    info!(
        "chroma-mcp server starting ({} client, tenant '{}', database '{}')",
        context.config().kind,
        context.config().tenant,
        context.config().database
    );

    let mut server = ChromaMcpServer::new(context);
    if eager {
        server.warm_up()?;
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server.serve(BufReader::new(stdin.lock()), stdout.lock())?;

    info!("chroma-mcp server stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::mcp::jsonrpc::INVALID_REQUEST;

    fn server() -> ChromaMcpServer {
        ChromaMcpServer::new(ClientContext::new(ClientConfig::default()))
    }

    fn request(value: Value) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    fn call(server: &mut ChromaMcpServer, name: &str, arguments: Value) -> Value {
        let response = server
            .handle_request(&request(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            })))
            .unwrap();
        response.result.unwrap()
    }

    fn text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[test]
    fn test_initialize_and_tools_list() {
        let mut server = server();
        let init = server
            .handle_request(&request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})))
            .unwrap();
        assert_eq!(init.result.unwrap()["serverInfo"]["name"], "chroma-mcp");

        let list = server
            .handle_request(&request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})))
            .unwrap();
        let tools = list.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 6);
    }

    #[test]
    fn test_notifications_get_no_response() {
        let mut server = server();
        let response = server.handle_request(&request(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ));
        assert!(response.is_none());
        assert!(server.state().initialized);
    }

    #[test]
    fn test_unknown_method() {
        let mut server = server();
        let response = server
            .handle_request(&request(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})))
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_wrong_jsonrpc_version_is_invalid_request() {
        let mut server = server();
        let response = server
            .handle_request(&request(json!({"jsonrpc": "1.0", "id": 5, "method": "ping"})))
            .unwrap();
        assert_eq!(response.id, json!(5));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_client_is_built_lazily() {
        let mut server = server();
        assert!(!server.state().context.is_ready());

        call(&mut server, "chroma_list_collections", json!({}));
        assert!(server.state().context.is_ready());
    }

    #[test]
    fn test_collection_tools() {
        let mut server = server();

        let created = call(
            &mut server,
            "chroma_create_collection",
            json!({"collection_name": "docs", "metadata": {"team": "search"}}),
        );
        assert!(created.get("isError").is_none());
        assert!(text(&created).contains("docs"));

        let listed = call(&mut server, "chroma_list_collections", json!({}));
        assert!(text(&listed).contains("Found 1 collection(s)"));

        let fetched = call(&mut server, "chroma_get_collection", json!({"collection_name": "docs"}));
        assert!(text(&fetched).contains("\"team\": \"search\""));

        call(&mut server, "chroma_delete_collection", json!({"collection_name": "docs"}));
        let missing = call(&mut server, "chroma_get_collection", json!({"collection_name": "docs"}));
        assert_eq!(missing["isError"], true);
        assert!(text(&missing).contains("not found"));
    }

    #[test]
    fn test_reset_requires_confirm_and_permission() {
        let mut server = server();
        let unconfirmed = call(&mut server, "chroma_reset", json!({}));
        assert_eq!(unconfirmed["isError"], true);

        let confirmed = call(&mut server, "chroma_reset", json!({"confirm": true}));
        assert!(confirmed.get("isError").is_none());

        let config = ClientConfig {
            allow_reset: false,
            ..ClientConfig::default()
        };
        let mut locked = ChromaMcpServer::new(ClientContext::new(config));
        let refused = call(&mut locked, "chroma_reset", json!({"confirm": true}));
        assert_eq!(refused["isError"], true);
        assert!(text(&refused).contains("reset is disabled"));
    }

    #[test]
    fn test_server_info_includes_provisioning() {
        let mut server = server();
        let info = call(&mut server, "chroma_get_server_info", json!({}));
        let body: Value = serde_json::from_str(text(&info)).unwrap();
        assert_eq!(body["client_type"], "ephemeral");
        assert_eq!(body["tenant"], "default_tenant");
        assert_eq!(body["provisioning"]["tenant_outcome"]["status"], "skipped_non_remote");
        assert_eq!(body["provisioning"]["states"][1], "CLIENT_READY");
    }

    #[test]
    fn test_serve_loop() -> anyhow::Result<()> {
        let input = concat!(
            r#"{"jsonrpc": "2.0", "id": 1, "method": "ping"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#,
            "\n",
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output)?;

        let lines: Vec<Value> = String::from_utf8(output)?
            .lines()
            .map(|l| serde_json::from_str(l))
            .collect::<Result<_, _>>()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
        Ok(())
    }
}
