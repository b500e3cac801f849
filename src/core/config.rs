//! Configuration management for Ensemble
//!
//! Supports environment variables, config files, and runtime overrides.
//! Agents can be declared in the config file and are registered into the
//! network at startup.
//!
//! Config file location: ~/.config/ensemble/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{EnsembleError, Result};

/// Main configuration for Ensemble
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Agent selection configuration
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Agents registered into the network at startup
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Network default model, used by agents without their own model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Model used for agent selection when no network default is set
    pub fallback: String,
}

/// Agent selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Output token budget for the selection call
    pub max_tokens: u32,
    /// Whether prompts are dispatched to multiple agents by default
    pub multiple_agents: bool,
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Whether agent output is streamed to stdout as it arrives
    pub enabled: bool,
}

/// Which generation flavor an agent wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Unconstrained text generation
    #[default]
    Text,
    /// Schema-constrained structured generation
    Object,
}

/// Declarative agent definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Registry name
    pub name: String,
    /// Generation flavor
    #[serde(default)]
    pub kind: AgentKind,
    /// Agent-specific model, overriding the network default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// System instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// JSON schema for object agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: env::var("ENSEMBLE_DEFAULT_MODEL").ok(),
            fallback: env::var("ENSEMBLE_FALLBACK_MODEL")
                .unwrap_or_else(|_| "qwen3:8b".to_string()),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            multiple_agents: false,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("ENSEMBLE_STREAMING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ensemble")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    ///
    /// A missing file yields the defaults; a broken one is an error.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self::load_from_file()?.unwrap_or_default())
    }

    /// Load configuration from the config file, if there is one
    pub fn load_from_file() -> Result<Option<Self>> {
        Self::load_from_path(&Self::config_file())
    }

    /// Load configuration from `path`, or `None` when it does not exist
    pub fn load_from_path(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map(Some)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EnsembleError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to the config file, returning its path
    ///
    /// An existing file is only replaced when `overwrite` is set.
    pub fn save(&self, overwrite: bool) -> Result<PathBuf> {
        let config_path = Self::config_file();
        self.save_to(&config_path, overwrite)?;
        Ok(config_path)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path, overwrite: bool) -> Result<()> {
        if path.exists() && !overwrite {
            return Err(EnsembleError::config(format!(
                "{} already exists",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| EnsembleError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Find a declared agent by name
    pub fn agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let mut config = Config::default();
        config.agents.push(AgentSpec {
            name: "writer".to_string(),
            kind: AgentKind::Text,
            model: None,
            system: Some("You write short, clear prose.".to_string()),
            schema: None,
            max_tokens: None,
            temperature: Some(0.7),
        });
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
