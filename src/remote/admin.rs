//! Tenant/database administration over HTTP
//!
//! One blocking round trip per call. Results are classified into
//! [`ApiStatus`] so callers never have to look at raw status codes.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use super::types::{ApiErrorResponse, CreateResourceRequest};
use super::{auth_headers, bearer, endpoint};
use crate::config::ClientConfig;

/// Classified outcome of an admin request that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Found,
    NotFound,
    Created,
    AlreadyExists,
    /// Any other answer: auth failures, 5xx, unexpected codes
    Rejected { status: u16, message: String },
}

/// The request never produced an HTTP answer (timeout, refused, bad URL)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        TransportError(format!("{}: {}", kind, err))
    }
}

pub type AdminResult = Result<ApiStatus, TransportError>;

/// Administrative surface of a Chroma server
pub trait AdminApi: Send + Sync {
    /// `GET /api/v2/tenants/{tenant}`
    fn get_tenant(&self, tenant: &str) -> AdminResult;

    /// `POST /api/v2/tenants` with `{"name": tenant}`
    fn create_tenant(&self, tenant: &str) -> AdminResult;

    /// `GET /api/v2/tenants/{tenant}/databases/{database}`
    fn get_database(&self, tenant: &str, database: &str) -> AdminResult;

    /// `POST /api/v2/tenants/{tenant}/databases` with `{"name": database}`
    fn create_database(&self, tenant: &str, database: &str) -> AdminResult;
}

/// Blocking HTTP implementation of [`AdminApi`]
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    client: Client,
    base_url: Url,
}

impl HttpAdminApi {
    /// Create from resolved client configuration, with the same auth
    /// headers the client backend sends for its kind
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let headers = auth_headers(config).map_err(TransportError)?;
        Self::with_headers(&config.base_url(), headers, config.provisioning.timeout_secs)
    }

    /// Create with explicit parameters; the key is sent as a bearer token
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = bearer(&key)
                .parse()
                .map_err(|e| TransportError(format!("invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Self::with_headers(base_url, headers, timeout_secs)
    }

    fn with_headers(
        base_url: &str,
        headers: HeaderMap,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError(format!("invalid server URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        endpoint(&self.base_url, segments).map_err(TransportError)
    }

    fn probe(&self, url: Url) -> AdminResult {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(TransportError::from_reqwest)?;
        Ok(classify_probe(response))
    }

    fn create(&self, url: Url, name: &str) -> AdminResult {
        let body = CreateResourceRequest {
            name: name.to_string(),
        };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .map_err(TransportError::from_reqwest)?;
        Ok(classify_create(response))
    }
}

impl AdminApi for HttpAdminApi {
    fn get_tenant(&self, tenant: &str) -> AdminResult {
        self.probe(self.url(&["api", "v2", "tenants", tenant])?)
    }

    fn create_tenant(&self, tenant: &str) -> AdminResult {
        self.create(self.url(&["api", "v2", "tenants"])?, tenant)
    }

    fn get_database(&self, tenant: &str, database: &str) -> AdminResult {
        self.probe(self.url(&["api", "v2", "tenants", tenant, "databases", database])?)
    }

    fn create_database(&self, tenant: &str, database: &str) -> AdminResult {
        self.create(self.url(&["api", "v2", "tenants", tenant, "databases"])?, database)
    }
}

fn classify_probe(response: Response) -> ApiStatus {
    let status = response.status();
    if status.is_success() {
        return ApiStatus::Found;
    }
    if status == StatusCode::NOT_FOUND {
        return ApiStatus::NotFound;
    }
    let body = ApiErrorResponse::from_body(&response.text().unwrap_or_default());
    // Some server versions answer a missing tenant with a 500 NotFoundError
    if body.is_not_found() {
        ApiStatus::NotFound
    } else {
        ApiStatus::Rejected {
            status: status.as_u16(),
            message: body.describe(),
        }
    }
}

fn classify_create(response: Response) -> ApiStatus {
    let status = response.status();
    if status.is_success() {
        return ApiStatus::Created;
    }
    if status == StatusCode::CONFLICT {
        return ApiStatus::AlreadyExists;
    }
    let body = ApiErrorResponse::from_body(&response.text().unwrap_or_default());
    if body.is_already_exists() {
        ApiStatus::AlreadyExists
    } else {
        ApiStatus::Rejected {
            status: status.as_u16(),
            message: body.describe(),
        }
    }
}
