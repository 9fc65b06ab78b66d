//! Server configuration

use clap::Parser;
use fraudserve_model::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fraudserve")]
#[command(about = "Real-time fraud classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FRAUDSERVE_CONFIG", default_value = "fraudserve.yaml")]
    pub config: String,

    /// Directory holding model artifacts and metadata documents
    #[arg(short, long, env = "FRAUDSERVE_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long, env = "HOST")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PORT")]
    pub port: Option<u16>,

    /// Log output format
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Artifact store layout
    #[serde(flatten)]
    pub registry: RegistryConfig,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply CLI and environment overrides
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.artifact_dir {
            self.registry.artifact_dir = dir.clone();
        }

        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            registry: RegistryConfig::default(),
            max_body_bytes: default_max_body_bytes(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}
