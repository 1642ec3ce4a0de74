//! JSON-RPC 2.0 envelopes for the stdio transport

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Error code and message carried back to the caller
pub type RpcFailure = (i64, String);

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// No id means notification: never answered
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn check_version(&self) -> Result<(), RpcFailure> {
        if self.jsonrpc == JSONRPC_VERSION {
            Ok(())
        } else {
            Err((
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", self.jsonrpc),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn error(id: Value, code: i64, message: String) -> Self {
        Self::reply(id, Err((code, message)))
    }

    pub fn reply(id: Value, outcome: Result<Value, RpcFailure>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err((code, message)) => (None, Some(JsonRpcError { code, message })),
        };
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_version_is_checked() {
        assert!(parse(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .check_version()
            .is_ok());

        let (code, message) = parse(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}))
            .check_version()
            .unwrap_err();
        assert_eq!(code, INVALID_REQUEST);
        assert!(message.contains("1.0"));

        let missing = parse(json!({"id": 1, "method": "ping"}));
        assert_eq!(missing.check_version().unwrap_err().0, INVALID_REQUEST);
    }

    #[test]
    fn test_error_reply_omits_result() {
        let reply = serde_json::to_value(JsonRpcResponse::error(json!(4), METHOD_NOT_FOUND, "nope".into()))
            .unwrap();
        assert_eq!(reply["jsonrpc"], "2.0");
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
        assert!(reply.get("result").is_none());
    }
}
