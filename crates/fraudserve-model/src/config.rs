//! Configuration for artifact discovery

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where artifacts live and how their files are named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory scanned for artifacts and metadata documents
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// File name prefix of model artifacts
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,

    /// Accepted artifact extensions, without the dot
    #[serde(default = "default_artifact_extensions")]
    pub artifact_extensions: Vec<String>,

    /// File name prefix of metadata documents
    #[serde(default = "default_metadata_prefix")]
    pub metadata_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            artifact_prefix: default_artifact_prefix(),
            artifact_extensions: default_artifact_extensions(),
            metadata_prefix: default_metadata_prefix(),
        }
    }
}

impl RegistryConfig {
    /// Default naming conventions rooted at `dir`
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the artifact prefix
    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    /// Replace the accepted artifact extensions
    pub fn with_artifact_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifact_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the metadata prefix
    pub fn with_metadata_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_prefix = prefix.into();
        self
    }
}

/// Extension of metadata documents
pub const METADATA_EXTENSION: &str = "json";

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("saved_models")
}

fn default_artifact_prefix() -> String {
    "best_model_".to_string()
}

fn default_artifact_extensions() -> Vec<String> {
    vec!["safetensors".to_string(), "bin".to_string()]
}

fn default_metadata_prefix() -> String {
    "model_metadata_".to_string()
}
