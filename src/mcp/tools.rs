//! MCP tool argument structs and the advertised tool list

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// List collections in the configured database
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListCollectionsTool {
    /// Maximum number of collections to return
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of collections to skip
    #[serde(default)]
    pub offset: usize,
}

/// Create a collection, or return it if it already exists
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCollectionTool {
    pub collection_name: String,
    /// Extra metadata, merged over the configured defaults
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Get or delete a single collection by name
#[derive(Debug, Deserialize, Serialize)]
pub struct CollectionNameTool {
    pub collection_name: String,
}

/// Drop all data from the database
#[derive(Debug, Deserialize, Serialize)]
pub struct ResetTool {
    /// Must be true
    #[serde(default)]
    pub confirm: bool,
}

/// Tool definitions returned by `tools/list`
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": "chroma_get_server_info",
            "description": "Show the resolved client configuration (kind, tenant, database), the tenant/database provisioning outcome and a server heartbeat.",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "chroma_list_collections",
            "description": "List collections in the configured tenant/database. Example: chroma_list_collections({\"limit\": 20, \"offset\": 0})",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "description": "Max collections to return" },
                    "offset": { "type": "integer", "description": "Collections to skip (default: 0)", "default": 0 }
                }
            }
        },
        {
            "name": "chroma_create_collection",
            "description": "Create a collection, or return the existing one with that name. Distance metric and embedding settings from the server configuration are stored in its metadata. Example: chroma_create_collection({\"collection_name\": \"docs\", \"metadata\": {\"team\": \"search\"}})",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "collection_name": { "type": "string", "description": "3-512 characters from [a-zA-Z0-9._-], starting and ending with a letter or digit" },
                    "metadata": { "type": "object", "description": "Extra collection metadata" }
                },
                "required": ["collection_name"]
            }
        },
        {
            "name": "chroma_get_collection",
            "description": "Get a collection's id and metadata by name.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "collection_name": { "type": "string" }
                },
                "required": ["collection_name"]
            }
        },
        {
            "name": "chroma_delete_collection",
            "description": "Delete a collection and everything in it.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "collection_name": { "type": "string" }
                },
                "required": ["collection_name"]
            }
        },
        {
            "name": "chroma_reset",
            "description": "Delete ALL collections and data. Only works when the server allows reset (CHROMA_ALLOW_RESET). Requires {\"confirm\": true}.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "confirm": { "type": "boolean", "description": "Must be true" }
                },
                "required": ["confirm"]
            }
        }
    ])
}
