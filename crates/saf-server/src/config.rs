//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SAF_CONFIG";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Classifier artifact, `.json` ensemble or `.onnx`
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Expected SHA-256 of the classifier artifact
    #[serde(default)]
    pub model_sha256: Option<String>,

    /// CSV decision log; empty disables logging
    #[serde(default = "default_decision_log_path")]
    pub decision_log_path: String,

    #[serde(default = "default_decision_log_capacity")]
    pub decision_log_capacity: usize,

    /// Comma-separated allowed origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Report scoring errors with HTTP 200 and an `error` field
    #[serde(default = "default_in_band_errors")]
    pub in_band_errors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("saf_model.json")
}

fn default_decision_log_path() -> String {
    "logs.csv".to_string()
}

fn default_decision_log_capacity() -> usize {
    saf_engine::decision_log::DEFAULT_CAPACITY
}

fn default_cors_origins() -> String {
    "http://localhost:3000,*".to_string()
}

fn default_in_band_errors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            model_sha256: None,
            decision_log_path: default_decision_log_path(),
            decision_log_capacity: default_decision_log_capacity(),
            cors_origins: default_cors_origins(),
            in_band_errors: default_in_band_errors(),
        }
    }
}

impl ServerConfig {
    /// Load from `saf.toml` (or `$SAF_CONFIG`) and `SAF_*` environment variables
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(file.as_deref())
    }

    pub fn load_from(file: Option<&str>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name("saf").required(false),
        };

        let config = config::Config::builder()
            .add_source(file_source)
            .add_source(config::Environment::with_prefix("SAF").try_parsing(true))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pinned checksum, ignoring an empty value
    pub fn model_sha256(&self) -> Option<&str> {
        self.model_sha256.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Decision log path, `None` when logging is disabled
    pub fn decision_log_path(&self) -> Option<PathBuf> {
        let path = self.decision_log_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
