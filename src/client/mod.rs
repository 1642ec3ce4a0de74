//! Chroma client construction
//!
//! # Architecture
//!
//! ```text
//! ClientContext ── owns ──> Option<ClientHandle>
//!       │                        │
//!       └─ ClientFactory ──> provisioning (remote-http only)
//!                           then HttpClient | LocalClient
//! ```
//!
//! The context is created by the process entry point and passed down.
//! The handle is built on first use and reused afterwards.

mod http;
mod local;

pub use http::HttpClient;
pub use local::LocalClient;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, ClientKind};
use crate::error::{Error, Result};
use crate::provision::{ProvisioningReport, ProvisioningState, Provisioner};
use crate::remote::{AdminApi, Collection, HttpAdminApi};

/// Operations every client backend supports
pub trait ChromaBackend: Send + Sync {
    fn kind(&self) -> ClientKind;

    /// Server time in nanoseconds
    fn heartbeat(&self) -> Result<u64>;

    fn version(&self) -> Result<String>;

    fn list_collections(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Collection>>;

    /// Get-or-create. Call-supplied metadata is merged over the configured
    /// collection defaults; an existing collection is returned unchanged.
    fn create_collection(&self, name: &str, metadata: Option<Map<String, Value>>) -> Result<Collection>;

    fn get_collection(&self, name: &str) -> Result<Collection>;

    fn delete_collection(&self, name: &str) -> Result<()>;

    fn count_collections(&self) -> Result<usize>;

    /// Drop all data. Refused unless reset is allowed.
    fn reset(&self) -> Result<()>;
}

/// Settings shared by all backends, taken from the config at construction
#[derive(Debug, Clone)]
pub(crate) struct ClientOptions {
    pub tenant: String,
    pub database: String,
    pub allow_reset: bool,
    pub collection_defaults: Map<String, Value>,
}

impl ClientOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            allow_reset: config.allow_reset,
            collection_defaults: config.collection_defaults(),
        }
    }

    pub fn metadata_for(&self, extra: Option<Map<String, Value>>) -> Map<String, Value> {
        let mut meta = self.collection_defaults.clone();
        meta.extend(extra.unwrap_or_default());
        meta
    }

    pub fn check_reset(&self) -> Result<()> {
        if self.allow_reset {
            Ok(())
        } else {
            Err(Error::ResetNotAllowed)
        }
    }
}

/// The constructed client, over one of the backends
pub enum ClientHandle {
    Http(HttpClient),
    Local(LocalClient),
}

impl ClientHandle {
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientHandle::Http(_))
    }
}

impl ChromaBackend for ClientHandle {
    fn kind(&self) -> ClientKind {
        match self {
            ClientHandle::Http(c) => c.kind(),
            ClientHandle::Local(c) => c.kind(),
        }
    }

    fn heartbeat(&self) -> Result<u64> {
        match self {
            ClientHandle::Http(c) => c.heartbeat(),
            ClientHandle::Local(c) => c.heartbeat(),
        }
    }

    fn version(&self) -> Result<String> {
        match self {
            ClientHandle::Http(c) => c.version(),
            ClientHandle::Local(c) => c.version(),
        }
    }

    fn list_collections(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Collection>> {
        match self {
            ClientHandle::Http(c) => c.list_collections(limit, offset),
            ClientHandle::Local(c) => c.list_collections(limit, offset),
        }
    }

    fn create_collection(&self, name: &str, metadata: Option<Map<String, Value>>) -> Result<Collection> {
        match self {
            ClientHandle::Http(c) => c.create_collection(name, metadata),
            ClientHandle::Local(c) => c.create_collection(name, metadata),
        }
    }

    fn get_collection(&self, name: &str) -> Result<Collection> {
        match self {
            ClientHandle::Http(c) => c.get_collection(name),
            ClientHandle::Local(c) => c.get_collection(name),
        }
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        match self {
            ClientHandle::Http(c) => c.delete_collection(name),
            ClientHandle::Local(c) => c.delete_collection(name),
        }
    }

    fn count_collections(&self) -> Result<usize> {
        match self {
            ClientHandle::Http(c) => c.count_collections(),
            ClientHandle::Local(c) => c.count_collections(),
        }
    }

    fn reset(&self) -> Result<()> {
        match self {
            ClientHandle::Http(c) => c.reset(),
            ClientHandle::Local(c) => c.reset(),
        }
    }
}

/// Provisions (remote-http only), then constructs a [`ClientHandle`]
#[derive(Default, Clone)]
pub struct ClientFactory {
    admin: Option<Arc<dyn AdminApi>>,
}

impl ClientFactory {
    /// Factory that talks to the configured server for provisioning
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory using the given admin API for provisioning
    pub fn with_admin(admin: Arc<dyn AdminApi>) -> Self {
        Self { admin: Some(admin) }
    }

    /// Run tenant/database provisioning. Never fails.
    pub fn provision(&self, config: &ClientConfig) -> ProvisioningReport {
        if !config.provisioning_applies() {
            debug!("Provisioning skipped for {} client", config.kind);
            return ProvisioningReport::skipped(config);
        }

        let policy = config.provisioning.probe_failure;
        match self.admin {
            Some(ref admin) => Provisioner::new(admin.as_ref(), policy).provision(config),
            None => match HttpAdminApi::from_config(config) {
                Ok(admin) => Provisioner::new(&admin, policy).provision(config),
                Err(e) => {
                    warn!("Auto-provisioning unavailable: {}", e);
                    ProvisioningReport::failed(config, e.to_string())
                }
            },
        }
    }

    /// Access probe for the configured database. Only meaningful for
    /// remote kinds; in-process kinds are always accessible.
    pub fn verify_access(&self, config: &ClientConfig) -> bool {
        if !config.kind.is_remote() {
            return true;
        }
        let policy = config.provisioning.probe_failure;
        match self.admin {
            Some(ref admin) => {
                Provisioner::new(admin.as_ref(), policy).verify_access(&config.tenant, &config.database)
            }
            None => match HttpAdminApi::from_config(config) {
                Ok(admin) => {
                    Provisioner::new(&admin, policy).verify_access(&config.tenant, &config.database)
                }
                Err(e) => {
                    warn!("Cannot verify access: {}", e);
                    false
                }
            },
        }
    }

    /// Provision, then construct. Only construction failures are errors.
    pub fn build(&self, config: &ClientConfig) -> Result<(ClientHandle, ProvisioningReport)> {
        if let Some(var) = config.embedding.missing_credential() {
            warn!(
                "Embedding function '{}' needs {} but it is not set",
                config.embedding.function, var
            );
        }
        if let Some(ref level) = config.isolation_level {
            debug!("Isolation level '{}' is recorded but not enforced", level);
        }

        let mut report = self.provision(config);

        let handle = match config.kind {
            ClientKind::Http | ClientKind::Cloud => HttpClient::connect(config).map(ClientHandle::Http),
            ClientKind::Ephemeral | ClientKind::Persistent => {
                LocalClient::open(config).map(ClientHandle::Local)
            }
        }
        .map_err(|e| {
            error!("{}", e);
            e
        })?;

        report.advance(ProvisioningState::ClientReady);
        info!(
            "Chroma client ready ({}, tenant '{}', database '{}')",
            config.kind, config.tenant, config.database
        );
        Ok((handle, report))
    }
}

/// Owns the configuration and the lazily built client handle
pub struct ClientContext {
    config: ClientConfig,
    factory: ClientFactory,
    handle: Option<ClientHandle>,
    report: Option<ProvisioningReport>,
}

impl ClientContext {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_factory(config, ClientFactory::new())
    }

    pub fn with_factory(config: ClientConfig, factory: ClientFactory) -> Self {
        Self {
            config,
            factory,
            handle: None,
            report: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the handle has been constructed
    pub fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    /// Provisioning report from construction, once built
    pub fn report(&self) -> Option<&ProvisioningReport> {
        self.report.as_ref()
    }

    /// The client handle, constructing it on the first call
    pub fn client(&mut self) -> Result<&ClientHandle> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                let (handle, report) = self.factory.build(&self.config)?;
                self.report = Some(report);
                handle
            }
        };
        Ok(self.handle.insert(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::tests::RecordingApi;
    use crate::provision::ProvisioningOutcome;
    use mockito::Server;

    fn http_config(server: &Server) -> ClientConfig {
        let addr = server.socket_address();
        ClientConfig {
            kind: ClientKind::Http,
            host: addr.ip().to_string(),
            port: addr.port(),
            tenant: "acme".to_string(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_ephemeral_build_makes_no_admin_calls() {
        let api = Arc::new(RecordingApi::absent());
        let factory = ClientFactory::with_admin(api.clone());

        let (handle, report) = factory.build(&ClientConfig::default()).unwrap();
        assert!(!handle.is_remote());
        assert_eq!(handle.kind(), ClientKind::Ephemeral);
        assert!(api.calls().is_empty());
        assert_eq!(report.tenant_outcome, ProvisioningOutcome::SkippedNonRemote);
        assert_eq!(report.state(), ProvisioningState::ClientReady);
    }

    #[test]
    fn test_http_build_provisions_then_connects() {
        let mut server = Server::new();
        let beat = server
            .mock("GET", "/api/v2/heartbeat")
            .with_status(200)
            .with_body(r#"{"nanosecond heartbeat": 1}"#)
            .create();

        let api = Arc::new(RecordingApi::absent());
        let (handle, report) = ClientFactory::with_admin(api.clone())
            .build(&http_config(&server))
            .unwrap();

        assert!(handle.is_remote());
        assert_eq!(
            api.calls(),
            vec![
                "get_tenant acme",
                "create_tenant acme",
                "get_database acme/default_database",
                "create_database acme/default_database",
            ]
        );
        assert_eq!(report.state(), ProvisioningState::ClientReady);
        assert_eq!(report.states.len(), 6);
        beat.assert();
    }

    #[test]
    fn test_provisioning_failure_does_not_block_construction() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v2/heartbeat")
            .with_status(200)
            .with_body(r#"{"nanosecond heartbeat": 1}"#)
            .create();

        let api = Arc::new(RecordingApi {
            tenant_create: Ok(crate::remote::ApiStatus::Rejected {
                status: 403,
                message: "forbidden".to_string(),
            }),
            database_create: Ok(crate::remote::ApiStatus::Rejected {
                status: 403,
                message: "forbidden".to_string(),
            }),
            ..RecordingApi::absent()
        });

        let (_, report) = ClientFactory::with_admin(api)
            .build(&http_config(&server))
            .unwrap();
        assert!(report.has_failures());
        assert_eq!(report.state(), ProvisioningState::ClientReady);
    }

    #[test]
    fn test_real_admin_api_against_mock_server() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v2/heartbeat")
            .with_body(r#"{"nanosecond heartbeat": 1}"#)
            .create();
        server.mock("GET", "/api/v2/tenants/acme").with_status(200).create();
        server
            .mock("GET", "/api/v2/tenants/acme/databases/default_database")
            .with_status(404)
            .create();
        let create_db = server
            .mock("POST", "/api/v2/tenants/acme/databases")
            .with_status(200)
            .with_body("{}")
            .create();

        let (_, report) = ClientFactory::new().build(&http_config(&server)).unwrap();
        assert_eq!(report.tenant_outcome, ProvisioningOutcome::AlreadyExisted);
        assert_eq!(report.database_outcome, ProvisioningOutcome::Created);
        create_db.assert();
    }

    #[test]
    fn test_unreachable_server_is_construction_error() {
        let config = ClientConfig {
            kind: ClientKind::Http,
            host: "127.0.0.1".to_string(),
            port: 9,
            provisioning: crate::config::ProvisioningConfig {
                timeout_secs: 1,
                ..Default::default()
            },
            ..ClientConfig::default()
        };
        let api = Arc::new(RecordingApi::absent());
        let err = ClientFactory::with_admin(api).build(&config).err().unwrap();
        assert!(matches!(err, Error::ClientConstruction(_)));
    }

    #[test]
    fn test_verify_access_cloud_uses_chroma_token() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v2/tenants/acme/databases/default_database")
            .match_header("x-chroma-token", mockito::Matcher::Missing)
            .with_status(401)
            .create();
        let with_token = server
            .mock("GET", "/api/v2/tenants/acme/databases/default_database")
            .match_header("x-chroma-token", "ck-123")
            .with_status(200)
            .with_body(r#"{"name": "default_database"}"#)
            .create();

        let config = ClientConfig {
            kind: ClientKind::Cloud,
            api_key: Some("ck-123".to_string()),
            ssl: false,
            ..http_config(&server)
        };

        assert!(ClientFactory::new().verify_access(&config));
        with_token.assert();
    }

    #[test]
    fn test_context_builds_once() {
        let api = Arc::new(RecordingApi::absent());
        let mut mock = Server::new();
        mock.mock("GET", "/api/v2/heartbeat")
            .with_body(r#"{"nanosecond heartbeat": 1}"#)
            .expect(1)
            .create();

        let mut context =
            ClientContext::with_factory(http_config(&mock), ClientFactory::with_admin(api.clone()));
        assert!(!context.is_ready());
        assert!(context.report().is_none());

        let first = context.client().unwrap() as *const ClientHandle;
        let second = context.client().unwrap() as *const ClientHandle;
        assert_eq!(first, second);
        assert!(context.is_ready());
        assert_eq!(api.calls().len(), 4);
        assert!(context.report().is_some());
    }

    #[test]
    fn test_context_local_collections() {
        let mut context = ClientContext::new(ClientConfig::default());
        let client = context.client().unwrap();
        client
            .create_collection("docs", serde_json::json!({"owner": "me"}).as_object().cloned())
            .unwrap();
        let docs = context.client().unwrap().get_collection("docs").unwrap();
        assert_eq!(docs.metadata.unwrap()["owner"], "me");
    }

    #[test]
    fn test_metadata_for_prefers_call_values() {
        let options = ClientOptions::from_config(&ClientConfig::default());
        let extra = serde_json::json!({"hnsw:space": "ip", "team": "a"});
        let merged = options.metadata_for(extra.as_object().cloned());
        assert_eq!(merged["hnsw:space"], "ip");
        assert_eq!(merged["team"], "a");
        assert_eq!(merged["embedding_function"], "default");
    }
}
