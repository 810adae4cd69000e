//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file consulted when `WELLNESS_CONFIG` is unset. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "wellness.toml";

const ENV_PREFIX: &str = "WELLNESS";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the prediction, health and metrics API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the trained artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Instance name attached to every structured log record
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

impl ServerConfig {
    /// Load configuration from the optional config file and `WELLNESS_*`
    /// environment variables. The environment wins.
    pub fn load() -> Result<Self> {
        let path = std::env::var("WELLNESS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::from_sources(&path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(path: &Path, env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(env.try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
