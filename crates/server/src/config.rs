//! Server configuration

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serving_lib::{ModelSource, ServiceKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PREDICTOR_CONFIG";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Which service this process runs
    #[serde(default)]
    pub service: ServiceKind,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `<name>.onnx` artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Per-model artifact path overrides, relative to `model_dir`
    #[serde(default)]
    pub models: HashMap<String, String>,

    /// Per-model pinned SHA-256 digests
    #[serde(default)]
    pub checksums: HashMap<String, String>,

    /// Tag attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

impl ServerConfig {
    /// Load from `predictor.{toml,yaml,json}` (or `$PREDICTOR_CONFIG`) and
    /// `PREDICTOR_*` environment variables
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref(), environment())
    }

    /// Load from an optional explicit file plus the given environment source.
    /// Without an explicit file, `predictor.*` is used when present.
    pub fn load_from(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("predictor").required(false),
        };

        let config: ServerConfig = config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("invalid configuration: host must not be empty");
        }

        let required: Vec<&str> = self.service.model_names().collect();
        for name in self.models.keys().chain(self.checksums.keys()) {
            if !required.contains(&name.as_str()) {
                bail!(
                    "invalid configuration: unknown model '{}' for the {} service",
                    name,
                    self.service
                );
            }
        }

        for (name, sha) in &self.checksums {
            if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                bail!("invalid configuration: checksum for '{name}' is not a SHA-256 hex digest");
            }
        }

        Ok(())
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Artifact sources for every model the service requires
    pub fn model_sources(&self) -> Vec<ModelSource> {
        self.service
            .model_sources(&self.model_dir, &self.models, &self.checksums)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("PREDICTOR")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
