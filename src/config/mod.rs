//! Configuration module
//!
//! Turns the process environment into an immutable [`ClientConfig`].
//! Unset variables fall back to documented defaults; only a value that is
//! present but malformed is an error.

pub mod env;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::embedding::EmbeddingSettings;
use crate::error::ConfigError;
use env::{bool_or, lookup, parse_bool, parse_port, parse_u64, vars, EnvSource, ProcessEnv};

pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATA_DIR: &str = "./chroma_data";
pub const CLOUD_HOST: &str = "api.trychroma.com";
pub const CLOUD_PORT: u16 = 443;

/// Which backend the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// In-process, discarded at exit
    #[default]
    Ephemeral,
    /// In-process, backed by `CHROMA_DATA_DIR`
    Persistent,
    /// Self-hosted Chroma server
    Http,
    /// Hosted Chroma Cloud
    Cloud,
}

impl ClientKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "ephemeral" => Ok(Self::Ephemeral),
            "persistent" => Ok(Self::Persistent),
            "http" | "remote-http" => Ok(Self::Http),
            "cloud" | "remote-cloud" => Ok(Self::Cloud),
            _ => Err(ConfigError::InvalidChoice {
                var: vars::CLIENT_TYPE,
                value: value.to_string(),
                expected: "ephemeral, persistent, http, cloud",
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Persistent => "persistent",
            Self::Http => "http",
            Self::Cloud => "cloud",
        }
    }

    /// Whether the client talks to a server over HTTP
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http | Self::Cloud)
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HNSW distance function for new collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    Ip,
}

impl DistanceMetric {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclidean" => Ok(Self::L2),
            "ip" | "inner_product" => Ok(Self::Ip),
            _ => Err(ConfigError::InvalidChoice {
                var: vars::DISTANCE_METRIC,
                value: value.to_string(),
                expected: "cosine, l2, ip",
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L2 => "l2",
            Self::Ip => "ip",
        }
    }
}

/// What an existence probe concludes when it cannot get an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeFailurePolicy {
    /// Treat the resource as missing, so creation is attempted
    #[default]
    AssumeAbsent,
    /// Treat the resource as present, so no creation is attempted
    AssumePresent,
}

impl ProbeFailurePolicy {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "assume-absent" | "absent" => Ok(Self::AssumeAbsent),
            "assume-present" | "present" => Ok(Self::AssumePresent),
            _ => Err(ConfigError::InvalidChoice {
                var: vars::PROBE_FAILURE_POLICY,
                value: value.to_string(),
                expected: "assume-absent, assume-present",
            }),
        }
    }
}

/// Tenant/database auto-creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub probe_failure: ProbeFailurePolicy,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
            probe_failure: ProbeFailurePolicy::AssumeAbsent,
        }
    }
}

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConfig {
    pub kind: ClientKind,
    /// Only set for the persistent kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub tenant: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub embedding: EmbeddingSettings,
    pub distance_metric: DistanceMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation_level: Option<String>,
    pub allow_reset: bool,
    pub provisioning: ProvisioningConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kind: ClientKind::Ephemeral,
            data_dir: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ssl: false,
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            embedding: EmbeddingSettings::default(),
            distance_metric: DistanceMetric::Cosine,
            collection_metadata: None,
            isolation_level: None,
            allow_reset: true,
            provisioning: ProvisioningConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(&ProcessEnv)
    }

    /// Resolve from any environment source. Reads only; same input, same output.
    pub fn resolve(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let kind = lookup(env, vars::CLIENT_TYPE)
            .map(|v| ClientKind::parse(&v))
            .transpose()?
            .unwrap_or_default();

        let cloud = kind == ClientKind::Cloud;

        let data_dir = (kind == ClientKind::Persistent).then(|| {
            lookup(env, vars::DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
        });

        let host = lookup(env, vars::HOST)
            .unwrap_or_else(|| (if cloud { CLOUD_HOST } else { DEFAULT_HOST }).to_string());

        let port = match lookup(env, vars::PORT) {
            Some(v) => parse_port(vars::PORT, &v)?,
            None if cloud => CLOUD_PORT,
            None => DEFAULT_PORT,
        };

        let ssl = match lookup(env, vars::SSL) {
            Some(v) => parse_bool(vars::SSL, &v)?,
            None => cloud,
        };

        let distance_metric = lookup(env, vars::DISTANCE_METRIC)
            .map(|v| DistanceMetric::parse(&v))
            .transpose()?
            .unwrap_or_default();

        let collection_metadata = lookup(env, vars::COLLECTION_METADATA)
            .map(|v| parse_metadata(&v))
            .transpose()?;

        let provisioning = ProvisioningConfig {
            enabled: bool_or(env, vars::AUTO_PROVISION, true)?,
            timeout_secs: match lookup(env, vars::PROVISION_TIMEOUT_SECS) {
                Some(v) => parse_u64(vars::PROVISION_TIMEOUT_SECS, &v)?,
                None => ProvisioningConfig::default().timeout_secs,
            },
            probe_failure: lookup(env, vars::PROBE_FAILURE_POLICY)
                .map(|v| ProbeFailurePolicy::parse(&v))
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            kind,
            data_dir,
            host,
            port,
            ssl,
            tenant: lookup(env, vars::TENANT).unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            database: lookup(env, vars::DATABASE).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            api_key: lookup(env, vars::API_KEY),
            embedding: EmbeddingSettings::resolve(env)?,
            distance_metric,
            collection_metadata,
            isolation_level: lookup(env, vars::ISOLATION_LEVEL),
            allow_reset: bool_or(env, vars::ALLOW_RESET, true)?,
            provisioning,
        })
    }

    /// `http(s)://host:port`
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Whether tenant/database provisioning applies to this configuration
    pub fn provisioning_applies(&self) -> bool {
        self.kind == ClientKind::Http && self.provisioning.enabled
    }

    /// Copy with the API key masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Metadata attached to every new collection: configured metadata,
    /// then the distance metric and embedding parameters on top.
    pub fn collection_defaults(&self) -> Map<String, Value> {
        let mut meta = self.collection_metadata.clone().unwrap_or_default();
        meta.insert("hnsw:space".into(), Value::from(self.distance_metric.as_str()));
        meta.insert(
            "embedding_function".into(),
            Value::from(self.embedding.function.as_str()),
        );
        if let Some(model) = self.embedding.model_name() {
            meta.insert("embedding_model".into(), Value::from(model));
        }
        if let Some(dims) = self.embedding.dimensions() {
            meta.insert("embedding_dimensions".into(), Value::from(dims));
        }
        meta
    }
}

fn parse_metadata(raw: &str) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ConfigError::InvalidJson {
        var: vars::COLLECTION_METADATA,
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(map) => match map.iter().find(|(_, v)| contains_null(v)) {
            Some((key, _)) => Err(ConfigError::InvalidJson {
                var: vars::COLLECTION_METADATA,
                reason: format!("'{}' holds a null value", key),
            }),
            None => Ok(map),
        },
        other => Err(ConfigError::InvalidJson {
            var: vars::COLLECTION_METADATA,
            reason: format!("expected a JSON object, got {}", json_type(&other)),
        }),
    }
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Load a `.env` file into the process environment.
///
/// Variables that are already set win over the file. Returns whether a file
/// was found.
pub fn load_dotenv(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(true)
}
