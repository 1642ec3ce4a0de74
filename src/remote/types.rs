//! Chroma REST API types
//!
//! DTOs for the `/api/v2` surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============== Admin Types ==============

/// Body of `POST /tenants` and `POST /tenants/{t}/databases`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
}

/// Tenant as returned by `GET /tenants/{t}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

/// Database as returned by `GET /tenants/{t}/databases/{d}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tenant: Option<String>,
}

// ============== Collection Types ==============

/// A collection as reported by the server (or the local catalog)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Body of `POST .../collections`
#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub get_or_create: bool,
}

// ============== Health Types ==============

/// `GET /heartbeat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    #[serde(rename = "nanosecond heartbeat")]
    pub nanosecond_heartbeat: u64,
}

// ============== Error Types ==============

/// Error body returned by the server, e.g.
/// `{"error": "NotFoundError", "message": "Tenant acme not found"}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ApiErrorResponse {
    /// Parse an error body, keeping raw text when it is not JSON
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            error: String::new(),
            message: body.trim().to_string(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        self.error == "NotFoundError" || self.message.to_ascii_lowercase().contains("not found")
    }

    pub fn is_already_exists(&self) -> bool {
        self.error == "UniqueConstraintError"
            || self.message.to_ascii_lowercase().contains("already exists")
    }

    pub fn describe(&self) -> String {
        match (self.error.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.error, self.message),
            (false, true) => self.error.clone(),
            (true, false) => self.message.clone(),
            (true, true) => "no error body".to_string(),
        }
    }
}
