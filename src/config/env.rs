//! Environment lookup and value parsing
//!
//! Resolution reads through [`EnvSource`] so the same code runs against the
//! process environment and against a plain map in tests.

use std::collections::HashMap;

use crate::error::ConfigError;

/// Names of every recognized variable
pub mod vars {
    pub const CLIENT_TYPE: &str = "CHROMA_CLIENT_TYPE";
    pub const DATA_DIR: &str = "CHROMA_DATA_DIR";
    pub const HOST: &str = "CHROMA_HOST";
    pub const PORT: &str = "CHROMA_PORT";
    pub const SSL: &str = "CHROMA_SSL";
    pub const TENANT: &str = "CHROMA_TENANT";
    pub const DATABASE: &str = "CHROMA_DATABASE";
    pub const API_KEY: &str = "CHROMA_API_KEY";
    pub const EMBEDDING_FUNCTION: &str = "CHROMA_EMBEDDING_FUNCTION";
    pub const OPENAI_EMBEDDING_MODEL: &str = "CHROMA_OPENAI_EMBEDDING_MODEL";
    pub const OPENAI_EMBEDDING_DIMENSIONS: &str = "CHROMA_OPENAI_EMBEDDING_DIMENSIONS";
    pub const DISTANCE_METRIC: &str = "CHROMA_DISTANCE_METRIC";
    pub const COLLECTION_METADATA: &str = "CHROMA_COLLECTION_METADATA";
    pub const ISOLATION_LEVEL: &str = "CHROMA_ISOLATION_LEVEL";
    pub const ALLOW_RESET: &str = "CHROMA_ALLOW_RESET";
    pub const AUTO_PROVISION: &str = "CHROMA_AUTO_PROVISION";
    pub const PROVISION_TIMEOUT_SECS: &str = "CHROMA_PROVISION_TIMEOUT_SECS";
    pub const PROBE_FAILURE_POLICY: &str = "CHROMA_PROBE_FAILURE_POLICY";
    pub const CPU_EXECUTION_PROVIDER: &str = "CHROMA_CPU_EXECUTION_PROVIDER";
    pub const OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
}

/// Read-only source of environment values
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Explicit values layered over another source; an override wins even
/// when the underlying source has the key
#[derive(Debug, Clone)]
pub struct EnvOverlay<E> {
    overrides: HashMap<String, String>,
    base: E,
}

impl<E: EnvSource> EnvOverlay<E> {
    pub fn new(base: E) -> Self {
        Self {
            overrides: HashMap::new(),
            base,
        }
    }

    /// Set `key` when `value` is present
    pub fn with(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.overrides.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl<E: EnvSource> EnvSource for EnvOverlay<E> {
    fn get(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| self.base.get(key))
    }
}

/// Trimmed value, with empty strings treated as unset
pub fn lookup(env: &impl EnvSource, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "t" | "y" | "on" => Ok(true),
        "false" | "no" | "0" | "f" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

pub fn bool_or(env: &impl EnvSource, var: &'static str, default: bool) -> Result<bool, ConfigError> {
    lookup(env, var).map_or(Ok(default), |v| parse_bool(var, &v))
}

pub fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            var,
            value: value.to_string(),
        }),
    }
}

pub fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidInteger {
        var,
        value: value.to_string(),
    })
}
