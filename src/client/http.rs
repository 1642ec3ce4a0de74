//! HTTP backend for the http and cloud client kinds

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use super::{ChromaBackend, ClientOptions};
use crate::config::{ClientConfig, ClientKind};
use crate::error::{Error, Result};
use crate::remote::{
    auth_headers, endpoint, ApiErrorResponse, Collection, CreateCollectionRequest, HeartbeatResponse,
};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for a Chroma server over `/api/v2`
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    kind: ClientKind,
    options: ClientOptions,
}

impl HttpClient {
    /// Build the client and check the server answers a heartbeat
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url()).map_err(Error::construction)?;

        let headers = auth_headers(config).map_err(Error::ClientConstruction)?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(Error::construction)?;

        let http = Self {
            client,
            base_url,
            kind: config.kind,
            options: ClientOptions::from_config(config),
        };

        let beat = http
            .heartbeat()
            .map_err(|e| Error::ClientConstruction(format!("{} unreachable: {}", http.base_url, e)))?;
        info!("Connected to Chroma at {} (heartbeat {})", http.base_url, beat);

        Ok(http)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.base_url, segments).map_err(Error::Backend)
    }

    fn collections_url(&self, tail: &[&str]) -> Result<Url> {
        let mut segments = vec![
            "api",
            "v2",
            "tenants",
            self.options.tenant.as_str(),
            "databases",
            self.options.database.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        builder.send().map_err(Error::backend)
    }

    /// Parse a success body, or turn the error body into [`Error`].
    /// `collection` names the collection for not-found mapping.
    fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        collection: Option<&str>,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().map_err(Error::backend);
        }

        let body = ApiErrorResponse::from_body(&response.text().unwrap_or_default());
        if let Some(name) = collection {
            if status == StatusCode::NOT_FOUND || body.is_not_found() {
                return Err(Error::CollectionNotFound(name.to_string()));
            }
        }
        Err(Error::Backend(format!("HTTP {}: {}", status.as_u16(), body.describe())))
    }
}

impl ChromaBackend for HttpClient {
    fn kind(&self) -> ClientKind {
        self.kind
    }

    fn heartbeat(&self) -> Result<u64> {
        let response = self.send(self.client.get(self.url(&["api", "v2", "heartbeat"])?))?;
        let beat: HeartbeatResponse = self.handle_response(response, None)?;
        Ok(beat.nanosecond_heartbeat)
    }

    fn version(&self) -> Result<String> {
        let response = self.send(self.client.get(self.url(&["api", "v2", "version"])?))?;
        self.handle_response(response, None)
    }

    fn list_collections(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Collection>> {
        let mut url = self.collections_url(&["collections"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if offset > 0 {
                query.append_pair("offset", &offset.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = self.send(self.client.get(url))?;
        self.handle_response(response, None)
    }

    fn create_collection(&self, name: &str, metadata: Option<Map<String, Value>>) -> Result<Collection> {
        let body = CreateCollectionRequest {
            name: name.to_string(),
            metadata: self.options.metadata_for(metadata),
            get_or_create: true,
        };
        debug!("Creating collection '{}' (get_or_create)", name);

        let response = self.send(self.client.post(self.collections_url(&["collections"])?).json(&body))?;
        self.handle_response(response, None)
    }

    fn get_collection(&self, name: &str) -> Result<Collection> {
        let response = self.send(self.client.get(self.collections_url(&["collections", name])?))?;
        self.handle_response(response, Some(name))
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let response =
            self.send(self.client.delete(self.collections_url(&["collections", name])?))?;
        let _: Value = self.handle_response(response, Some(name))?;
        Ok(())
    }

    fn count_collections(&self) -> Result<usize> {
        let response = self.send(self.client.get(self.collections_url(&["collections_count"])?))?;
        self.handle_response(response, None)
    }

    fn reset(&self) -> Result<()> {
        self.options.check_reset()?;
        let response = self.send(self.client.post(self.url(&["api", "v2", "reset"])?))?;
        let _: Value = self.handle_response(response, None)?;
        info!("Reset Chroma at {}", self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};

    fn config_for(server: &Server, kind: ClientKind) -> ClientConfig {
        let addr = server.socket_address();
        ClientConfig {
            kind,
            host: addr.ip().to_string(),
            port: addr.port(),
            ssl: false,
            tenant: "acme".to_string(),
            database: "main".to_string(),
            ..ClientConfig::default()
        }
    }

    fn heartbeat(server: &mut ServerGuard) -> Mock {
        server
            .mock("GET", "/api/v2/heartbeat")
            .with_status(200)
            .with_body(r#"{"nanosecond heartbeat": 42}"#)
            .create()
    }

    #[test]
    fn test_connect_sends_bearer_token() {
        let mut server = Server::new();
        let beat = server
            .mock("GET", "/api/v2/heartbeat")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"nanosecond heartbeat": 42}"#)
            .create();

        let mut config = config_for(&server, ClientKind::Http);
        config.api_key = Some("secret".to_string());

        let client = HttpClient::connect(&config).unwrap();
        assert_eq!(client.kind(), ClientKind::Http);
        beat.assert();
    }

    #[test]
    fn test_cloud_uses_token_header() {
        let mut server = Server::new();
        let beat = server
            .mock("GET", "/api/v2/heartbeat")
            .match_header("x-chroma-token", "ck-123")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"nanosecond heartbeat": 1}"#)
            .create();

        let mut config = config_for(&server, ClientKind::Cloud);
        config.api_key = Some("ck-123".to_string());

        HttpClient::connect(&config).unwrap();
        beat.assert();
    }

    #[test]
    fn test_cloud_without_key_fails() {
        let server = Server::new();
        let err = HttpClient::connect(&config_for(&server, ClientKind::Cloud)).unwrap_err();
        assert!(matches!(err, Error::ClientConstruction(_)));
    }

    #[test]
    fn test_failed_heartbeat_is_construction_error() {
        let mut server = Server::new();
        server.mock("GET", "/api/v2/heartbeat").with_status(503).create();

        let err = HttpClient::connect(&config_for(&server, ClientKind::Http)).unwrap_err();
        assert!(matches!(err, Error::ClientConstruction(_)));
    }

    #[test]
    fn test_create_collection_merges_metadata() {
        let mut server = Server::new();
        heartbeat(&mut server);
        let create = server
            .mock("POST", "/api/v2/tenants/acme/databases/main/collections")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "docs",
                "get_or_create": true,
                "metadata": {"hnsw:space": "cosine", "owner": "me"}
            })))
            .with_status(200)
            .with_body(r#"{"id": "c1", "name": "docs", "metadata": {"hnsw:space": "cosine", "owner": "me"}}"#)
            .create();

        let client = HttpClient::connect(&config_for(&server, ClientKind::Http)).unwrap();
        let extra = serde_json::json!({"owner": "me"}).as_object().cloned();
        let collection = client.create_collection("docs", extra).unwrap();

        assert_eq!(collection.id, "c1");
        create.assert();
    }

    #[test]
    fn test_list_and_count() {
        let mut server = Server::new();
        heartbeat(&mut server);
        server
            .mock("GET", "/api/v2/tenants/acme/databases/main/collections")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "10".into()),
                Matcher::UrlEncoded("offset".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": "c1", "name": "docs", "metadata": null}]"#)
            .create();
        server
            .mock("GET", "/api/v2/tenants/acme/databases/main/collections_count")
            .with_status(200)
            .with_body("7")
            .create();

        let client = HttpClient::connect(&config_for(&server, ClientKind::Http)).unwrap();
        let listed = client.list_collections(Some(10), 5).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "docs");
        assert_eq!(client.count_collections().unwrap(), 7);
    }

    #[test]
    fn test_missing_collection_maps_to_not_found() {
        let mut server = Server::new();
        heartbeat(&mut server);
        server
            .mock("GET", "/api/v2/tenants/acme/databases/main/collections/ghost")
            .with_status(404)
            .with_body(r#"{"error": "NotFoundError", "message": "Collection ghost does not exist"}"#)
            .create();
        server
            .mock("DELETE", "/api/v2/tenants/acme/databases/main/collections/ghost")
            .with_status(500)
            .with_body(r#"{"error": "NotFoundError", "message": "Collection not found"}"#)
            .create();

        let client = HttpClient::connect(&config_for(&server, ClientKind::Http)).unwrap();
        assert!(matches!(client.get_collection("ghost"), Err(Error::CollectionNotFound(n)) if n == "ghost"));
        assert!(matches!(client.delete_collection("ghost"), Err(Error::CollectionNotFound(_))));
    }

    #[test]
    fn test_reset_is_refused_when_disabled() {
        let mut server = Server::new();
        heartbeat(&mut server);
        let reset = server.mock("POST", "/api/v2/reset").with_body("true").expect(0).create();

        let mut config = config_for(&server, ClientKind::Http);
        config.allow_reset = false;

        let client = HttpClient::connect(&config).unwrap();
        assert!(matches!(client.reset(), Err(Error::ResetNotAllowed)));
        reset.assert();
    }

    #[test]
    fn test_reset_and_version() {
        let mut server = Server::new();
        heartbeat(&mut server);
        server.mock("POST", "/api/v2/reset").with_body("true").create();
        server.mock("GET", "/api/v2/version").with_body(r#""1.0.20""#).create();

        let client = HttpClient::connect(&config_for(&server, ClientKind::Http)).unwrap();
        client.reset().unwrap();
        assert_eq!(client.version().unwrap(), "1.0.20");
    }
}
