//! Artifact discovery in the model store

use crate::config::{RegistryConfig, METADATA_EXTENSION};
use fraudserve_core::{Error, ModelMetadata, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files chosen by a registry scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSelection {
    /// The active model artifact
    pub artifact: PathBuf,

    /// The newest metadata document, if any
    pub metadata: Option<PathBuf>,
}

/// Selects the active artifact and metadata document from a directory.
///
/// File names embed a sortable suffix, so the lexicographically greatest
/// match is the most recent one. Artifacts and metadata are selected
/// independently of each other.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    config: RegistryConfig,
}

impl ArtifactRegistry {
    /// Create a registry from configuration
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Create a registry with default naming conventions
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(RegistryConfig::from_dir(dir))
    }

    /// Registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Scan the store and pick the newest artifact and metadata document
    pub fn scan(&self) -> Result<ArtifactSelection> {
        let dir = &self.config.artifact_dir;
        let names = list_file_names(dir).map_err(|e| {
            Error::artifact_not_found(format!(
                "cannot read artifact directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let artifact = names
            .iter()
            .filter(|name| self.is_artifact(name))
            .max()
            .ok_or_else(|| {
                Error::artifact_not_found(format!(
                    "no file matching {}*.{{{}}} in {}",
                    self.config.artifact_prefix,
                    self.config.artifact_extensions.join(","),
                    dir.display()
                ))
            })?;

        let metadata = names.iter().filter(|name| self.is_metadata(name)).max();

        debug!(
            candidates = names.len(),
            artifact = %artifact,
            metadata = ?metadata,
            "Scanned artifact store"
        );

        Ok(ArtifactSelection {
            artifact: dir.join(artifact),
            metadata: metadata.map(|name| dir.join(name)),
        })
    }

    /// Version tag of an artifact: its file name without prefix and extension
    pub fn version_tag(&self, artifact: &Path) -> String {
        let stem = artifact
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        stem.strip_prefix(self.config.artifact_prefix.as_str())
            .unwrap_or(stem)
            .to_string()
    }

    fn is_artifact(&self, name: &str) -> bool {
        name.starts_with(self.config.artifact_prefix.as_str())
            && extension(name).map_or(false, |ext| {
                self.config.artifact_extensions.iter().any(|e| e == ext)
            })
    }

    fn is_metadata(&self, name: &str) -> bool {
        name.starts_with(self.config.metadata_prefix.as_str())
            && extension(name) == Some(METADATA_EXTENSION)
    }
}

/// Scan a directory with the default naming conventions
pub fn scan_directory(dir: impl Into<PathBuf>) -> Result<ArtifactSelection> {
    ArtifactRegistry::from_dir(dir).scan()
}

/// Read a metadata document
pub fn load_metadata(path: impl AsRef<Path>) -> Result<ModelMetadata> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::model_load(format!("Failed to read metadata {}: {}", path.display(), e))
    })?;

    let metadata: ModelMetadata = serde_json::from_str(&contents).map_err(|e| {
        Error::model_load(format!("Failed to parse metadata {}: {}", path.display(), e))
    })?;

    let mistyped = metadata.mistyped_keys();
    if !mistyped.is_empty() {
        warn!(
            path = %path.display(),
            keys = ?mistyped,
            "Metadata fields have unexpected types; using placeholders"
        );
    }

    info!(
        path = %path.display(),
        model = metadata.name.as_deref().unwrap_or("unknown"),
        features = metadata.features.len(),
        "Loaded model metadata"
    );

    Ok(metadata)
}

fn list_file_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }
        dir
    }

    #[test]
    fn picks_most_recent_artifact() {
        let dir = store(&["best_model_2024-01-01.bin", "best_model_2024-06-01.bin"]);

        let selection = scan_directory(dir.path()).unwrap();
        assert_eq!(selection.artifact, dir.path().join("best_model_2024-06-01.bin"));
        assert_eq!(selection.metadata, None);
    }

    #[test]
    fn metadata_is_selected_independently() {
        let dir = store(&[
            "best_model_20240101_120000.safetensors",
            "model_metadata_20231231_000000.json",
            "model_metadata_20240315_000000.json",
        ]);

        let selection = scan_directory(dir.path()).unwrap();
        assert_eq!(
            selection.artifact,
            dir.path().join("best_model_20240101_120000.safetensors")
        );
        assert_eq!(
            selection.metadata,
            Some(dir.path().join("model_metadata_20240315_000000.json"))
        );
    }

    #[test]
    fn ignores_non_matching_files_and_directories() {
        let dir = store(&[
            "best_model_2024-01-01.bin",
            "best_model_2025-01-01.txt",
            "other_model_2026-01-01.bin",
            "model_metadata_2025-01-01.yaml",
        ]);
        std::fs::create_dir(dir.path().join("best_model_2027-01-01.bin")).unwrap();

        let selection = scan_directory(dir.path()).unwrap();
        assert_eq!(selection.artifact, dir.path().join("best_model_2024-01-01.bin"));
        assert_eq!(selection.metadata, None);
    }

    #[test]
    fn empty_store_is_artifact_not_found() {
        let dir = store(&["model_metadata_2024-01-01.json"]);
        assert!(matches!(
            scan_directory(dir.path()),
            Err(Error::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn missing_directory_is_artifact_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_directory(dir.path().join("nope")),
            Err(Error::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn custom_naming_conventions() {
        let dir = store(&["fraud_v1.pt", "fraud_v2.pt", "best_model_v9.bin"]);
        let registry = ArtifactRegistry::new(
            RegistryConfig::from_dir(dir.path())
                .with_artifact_prefix("fraud_")
                .with_artifact_extensions(["pt"]),
        );

        let selection = registry.scan().unwrap();
        assert_eq!(selection.artifact, dir.path().join("fraud_v2.pt"));
        assert_eq!(registry.version_tag(&selection.artifact), "v2");
    }

    #[test]
    fn version_tag_strips_prefix_and_extension() {
        let registry = ArtifactRegistry::from_dir("saved_models");
        assert_eq!(
            registry.version_tag(Path::new("saved_models/best_model_2024-06-01.bin")),
            "2024-06-01"
        );
    }

    #[test]
    fn metadata_documents_are_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model_metadata_2024-06-01.json");
        std::fs::write(
            &path,
            r#"{"model_name": "XGBoost", "f1_score": 0.93, "accuracy": 0.98, "features": ["Age"]}"#,
        )
        .unwrap();

        let metadata = load_metadata(&path).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("XGBoost"));
        assert_eq!(metadata.f1_score, Some(0.93));

        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(load_metadata(&path), Err(Error::ModelLoad(_))));

        std::fs::write(&path, br#"["not", "an", "object"]"#).unwrap();
        assert!(matches!(load_metadata(&path), Err(Error::ModelLoad(_))));
    }
}
