//! Configuration management for the MMLU-Pro evaluation driver
//!
//! Loads endpoint, sampling and run settings from TOML files. Every field has
//! a default, so an empty file (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Inference server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL up to and including `/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as a bearer token
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

/// Fixed sampling parameters sent with every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Evaluation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Questions per dispatch batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum in-flight requests across the whole run
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-request deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Directory holding the test and validation splits
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Delay between attempts to read an unreadable result file
    #[serde(default = "default_read_retry_delay_ms")]
    pub read_retry_delay_ms: u64,
    /// Seed for the missing-prediction fallback on reload
    #[serde(default = "default_seed")]
    pub seed: u64,
}

// Default value functions
fn default_base_url() -> String { "http://127.0.0.1:3000/v1".to_string() }
fn default_api_key() -> String { "nokey".to_string() }
fn default_max_tokens() -> u32 { 8192 }
fn default_top_p() -> f32 { 0.95 }
fn default_top_k() -> u32 { 20 }
fn default_temperature() -> f32 { 0.6 }
fn default_batch_size() -> usize { 10 }
fn default_max_concurrent() -> usize { 5 }
fn default_timeout_ms() -> u64 { 300_000 }
fn default_output_dir() -> String { "eval_results/".to_string() }
fn default_data_dir() -> String { "data/mmlu-pro".to_string() }
fn default_read_retry_delay_ms() -> u64 { 2_000 }
fn default_seed() -> u64 { 12345 }

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            temperature: default_temperature(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            timeout_ms: default_timeout_ms(),
            output_dir: default_output_dir(),
            data_dir: default_data_dir(),
            read_retry_delay_ms: default_read_retry_delay_ms(),
            seed: default_seed(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/eval.toml",
            "mmlu-pro-eval/config/eval.toml",
        ];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Full URL of the chat-completion route
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'))
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
