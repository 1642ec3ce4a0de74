//! MCP Server state management

use ulid::Ulid;

use crate::client::{ClientContext, ClientHandle};

/// MCP Server state - holds all runtime data
pub struct ServerState {
    /// Owns the lazily built Chroma client
    pub context: ClientContext,
    /// Whether client has sent `notifications/initialized`
    pub initialized: bool,
    /// Unique session ID for this MCP connection
    pub session_id: String,
}

impl ServerState {
    pub fn new(context: ClientContext) -> Self {
        Self {
            context,
            initialized: false,
            session_id: format!("mcp-{}", Ulid::new()),
        }
    }

    /// Client handle for tool handlers, built on first use
    pub fn client(&mut self) -> Result<&ClientHandle, String> {
        self.context.client().map_err(|e| e.to_string())
    }
}
