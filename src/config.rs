//! Application configuration
//!
//! Loaded from an optional YAML file; the CLI layers flag and environment
//! overrides on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// LLM Provider options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    OpenAI,
    Ollama,
    Gemini,
    /// Offline provider returning canned text
    Mock,
}

impl FromStr for LLMProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "ollama" => Ok(LLMProvider::Ollama),
            "gemini" => Ok(LLMProvider::Gemini),
            "mock" => Ok(LLMProvider::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LLMProvider::OpenAI => "openai",
            LLMProvider::Ollama => "ollama",
            LLMProvider::Gemini => "gemini",
            LLMProvider::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// Graph store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// HTTP base URL of the Neo4j server
    pub url: String,
    pub user: String,
    pub password: String,
    /// Target database name
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
        }
    }
}

/// Configuration for schema refinement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    /// The LLM provider to use
    pub provider: LLMProvider,
    /// Model name (e.g., "gemini-1.5-flash", "gpt-4o", "llama3")
    pub model: String,
    /// API Key (optional, can be loaded from env if None)
    pub api_key: Option<String>,
    /// API Base URL (required for Ollama, optional for others)
    pub api_base_url: Option<String>,
    /// System prompt for the LLM
    pub system_prompt: Option<String>,
    /// Sampling temperature; the provider default applies when unset
    pub temperature: Option<f32>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            api_base_url: None,
            system_prompt: None,
            temperature: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub refine: RefineConfig,
}

impl AppConfig {
    /// Parse configuration from a YAML document
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.store.url, "http://localhost:7474");
        assert_eq!(config.store.user, "neo4j");
        assert_eq!(config.store.database, "neo4j");
        assert_eq!(config.refine.provider, LLMProvider::Gemini);
        assert_eq!(config.refine.model, "gemini-1.5-flash");
        assert!(config.refine.api_key.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
store:
  url: "http://graph.internal:7474"
  password: "s3cret"
refine:
  provider: Ollama
  model: llama3
  api_base_url: "http://localhost:11434"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.store.url, "http://graph.internal:7474");
        assert_eq!(config.store.user, "neo4j");
        assert_eq!(config.store.password, "s3cret");
        assert_eq!(config.refine.provider, LLMProvider::Ollama);
        assert_eq!(config.refine.model, "llama3");
        assert_eq!(config.refine.api_base_url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            AppConfig::from_yaml("store: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Gemini".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!("MOCK".parse::<LLMProvider>().unwrap(), LLMProvider::Mock);
        assert!(matches!(
            "claude".parse::<LLMProvider>(),
            Err(ConfigError::UnknownProvider(_))
        ));
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }
}
