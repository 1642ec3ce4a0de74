//! Embedding function selection
//!
//! Embeddings are computed by the Chroma server (or its client libraries),
//! never here. This module only names the family, carries its parameters and
//! checks that the credentials it needs are present.

use serde::{Deserialize, Serialize};

use crate::config::env::{lookup, vars, EnvSource};
use crate::error::ConfigError;

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Embedding function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFunction {
    /// Local ONNX MiniLM-L6-v2 (also selected by "fast")
    #[default]
    Default,
    /// Local sentence-transformers all-mpnet-base-v2
    Accurate,
    OpenAi,
    Cohere,
    HuggingFace,
    VoyageAi,
    Google,
    Bedrock,
    Ollama,
}

const EMBEDDING_CHOICES: &str =
    "default, fast, accurate, openai, cohere, huggingface, voyageai, google, bedrock, ollama";

impl EmbeddingFunction {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "default" | "fast" => Ok(Self::Default),
            "accurate" => Ok(Self::Accurate),
            "openai" => Ok(Self::OpenAi),
            "cohere" => Ok(Self::Cohere),
            "huggingface" => Ok(Self::HuggingFace),
            "voyageai" => Ok(Self::VoyageAi),
            "google" => Ok(Self::Google),
            "bedrock" => Ok(Self::Bedrock),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidChoice {
                var: vars::EMBEDDING_FUNCTION,
                value: value.to_string(),
                expected: EMBEDDING_CHOICES,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Accurate => "accurate",
            Self::OpenAi => "openai",
            Self::Cohere => "cohere",
            Self::HuggingFace => "huggingface",
            Self::VoyageAi => "voyageai",
            Self::Google => "google",
            Self::Bedrock => "bedrock",
            Self::Ollama => "ollama",
        }
    }

    /// Environment variable holding the provider API key, if the family needs one.
    /// Bedrock uses the AWS credential chain and has none.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Cohere => Some("COHERE_API_KEY"),
            Self::HuggingFace => Some("HUGGINGFACE_API_KEY"),
            Self::VoyageAi => Some("VOYAGEAI_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Default | Self::Accurate | Self::Bedrock | Self::Ollama => None,
        }
    }

    /// Model used when the family has a fixed default
    fn default_model(&self) -> Option<&'static str> {
        match self {
            Self::Default => Some("all-MiniLM-L6-v2"),
            Self::Accurate => Some("all-mpnet-base-v2"),
            Self::HuggingFace => Some("sentence-transformers/all-MiniLM-L6-v2"),
            Self::Bedrock => Some("amazon.titan-embed-text-v1"),
            Self::Ollama => Some("nomic-embed-text"),
            Self::OpenAi | Self::Cohere | Self::VoyageAi | Self::Google => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Default | Self::Accurate)
    }
}

impl std::fmt::Display for EmbeddingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution provider hint for the local ONNX models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CpuExecutionProvider {
    #[default]
    Auto,
    /// Force CPU
    True,
    /// Use whatever accelerators are available
    False,
}

impl CpuExecutionProvider {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            _ => Err(ConfigError::InvalidChoice {
                var: vars::CPU_EXECUTION_PROVIDER,
                value: value.to_string(),
                expected: "auto, true, false",
            }),
        }
    }
}

/// Resolved embedding parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingSettings {
    pub function: EmbeddingFunction,
    pub openai_model: String,
    /// Explicit `CHROMA_OPENAI_EMBEDDING_DIMENSIONS`, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_dimensions: Option<usize>,
    pub cpu_execution_provider: CpuExecutionProvider,
    pub ollama_base_url: String,
    /// Provider key variable the family needs but the environment lacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_key_var: Option<&'static str>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            function: EmbeddingFunction::Default,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            explicit_dimensions: None,
            cpu_execution_provider: CpuExecutionProvider::Auto,
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            missing_key_var: None,
        }
    }
}

impl EmbeddingSettings {
    pub fn resolve(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let function = lookup(env, vars::EMBEDDING_FUNCTION)
            .map(|v| EmbeddingFunction::parse(&v))
            .transpose()?
            .unwrap_or_default();

        let explicit_dimensions = lookup(env, vars::OPENAI_EMBEDDING_DIMENSIONS)
            .map(|v| {
                v.parse::<usize>().map_err(|_| ConfigError::InvalidInteger {
                    var: vars::OPENAI_EMBEDDING_DIMENSIONS,
                    value: v.clone(),
                })
            })
            .transpose()?;

        let cpu_execution_provider = lookup(env, vars::CPU_EXECUTION_PROVIDER)
            .map(|v| CpuExecutionProvider::parse(&v))
            .transpose()?
            .unwrap_or_default();

        let missing_key_var = function
            .api_key_var()
            .filter(|var| lookup(env, var).is_none());

        Ok(Self {
            function,
            openai_model: lookup(env, vars::OPENAI_EMBEDDING_MODEL)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            explicit_dimensions,
            cpu_execution_provider,
            ollama_base_url: lookup(env, vars::OLLAMA_BASE_URL)
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            missing_key_var,
        })
    }

    /// Model name passed to the embedding function, if known
    pub fn model_name(&self) -> Option<&str> {
        match self.function {
            EmbeddingFunction::OpenAi => Some(&self.openai_model),
            other => other.default_model(),
        }
    }

    /// Vector dimensionality. Only OpenAI models are tunable; an explicit
    /// value wins over the per-model default.
    pub fn dimensions(&self) -> Option<usize> {
        if self.function != EmbeddingFunction::OpenAi {
            return None;
        }
        self.explicit_dimensions
            .or(match self.openai_model.as_str() {
                "text-embedding-3-small" => Some(1536),
                "text-embedding-3-large" => Some(1024),
                _ => None,
            })
    }

    /// Name of the API key variable the selected family needs, if it was
    /// unset in the environment the settings were resolved from
    pub fn missing_credential(&self) -> Option<&'static str> {
        self.missing_key_var
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fast_is_alias_for_default() {
        assert_eq!(EmbeddingFunction::parse("fast"), Ok(EmbeddingFunction::Default));
        assert_eq!(EmbeddingFunction::parse("FAST"), Ok(EmbeddingFunction::Default));
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        assert!(matches!(
            EmbeddingFunction::parse("word2vec"),
            Err(ConfigError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_openai_dimension_defaults() {
        let small = EmbeddingSettings::resolve(&env(&[("CHROMA_EMBEDDING_FUNCTION", "openai")])).unwrap();
        assert_eq!(small.dimensions(), Some(1536));

        let large = EmbeddingSettings::resolve(&env(&[
            ("CHROMA_EMBEDDING_FUNCTION", "openai"),
            ("CHROMA_OPENAI_EMBEDDING_MODEL", "text-embedding-3-large"),
        ]))
        .unwrap();
        assert_eq!(large.dimensions(), Some(1024));

        let ada = EmbeddingSettings::resolve(&env(&[
            ("CHROMA_EMBEDDING_FUNCTION", "openai"),
            ("CHROMA_OPENAI_EMBEDDING_MODEL", "text-embedding-ada-002"),
        ]))
        .unwrap();
        assert_eq!(ada.dimensions(), None);
    }

    #[test]
    fn test_explicit_dimensions_win() {
        let s = EmbeddingSettings::resolve(&env(&[
            ("CHROMA_EMBEDDING_FUNCTION", "openai"),
            ("CHROMA_OPENAI_EMBEDDING_DIMENSIONS", "512"),
        ]))
        .unwrap();
        assert_eq!(s.dimensions(), Some(512));
        assert_eq!(s.model_name(), Some("text-embedding-3-small"));
    }

    #[test]
    fn test_malformed_dimensions_is_an_error() {
        let err = EmbeddingSettings::resolve(&env(&[("CHROMA_OPENAI_EMBEDDING_DIMENSIONS", "big")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInteger { .. }));
    }

    #[test]
    fn test_missing_credential() {
        let s = EmbeddingSettings::resolve(&env(&[("CHROMA_EMBEDDING_FUNCTION", "cohere")])).unwrap();
        assert_eq!(s.missing_credential(), Some("COHERE_API_KEY"));

        let keyed = EmbeddingSettings::resolve(&env(&[
            ("CHROMA_EMBEDDING_FUNCTION", "cohere"),
            ("COHERE_API_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(keyed.missing_credential(), None);

        let local = EmbeddingSettings::resolve(&env(&[])).unwrap();
        assert_eq!(local.missing_credential(), None);
    }
}
