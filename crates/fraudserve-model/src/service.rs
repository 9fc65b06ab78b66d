//! Model service: owns the active classifier for the process lifetime
//!
//! The service starts `Uninitialized`. [`ModelService::init`] scans the
//! artifact store and loads the newest artifact exactly once, ending in
//! either `Loaded` or the terminal `FailedToLoad`. After that the state is
//! read-only, so scoring calls share it without locking.

use crate::classifier::{FraudClassifier, Inference};
use crate::features::FeatureMatrix;
use crate::model_loader::ModelArtifact;
use crate::registry::{load_metadata, ArtifactRegistry};
use fraudserve_core::{
    Error, ModelMetadata, PredictionEnvelope, PredictionResult, ResponseBuilder, Result,
    TransactionRecord,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle of the model service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Uninitialized,
    Loaded,
    FailedToLoad,
}

/// Everything the service holds once a model is loaded
struct LoadedState {
    artifact: ModelArtifact,
    metadata: Option<ModelMetadata>,
    feature_columns: Vec<String>,
    supports_probabilities: bool,
}

impl LoadedState {
    fn new(artifact: ModelArtifact, metadata: Option<ModelMetadata>) -> Self {
        let feature_columns = ModelMetadata::feature_columns(metadata.as_ref());
        let supports_probabilities = artifact.classifier.supports_probabilities();

        if let Some(width) = artifact.classifier.input_width() {
            if width != feature_columns.len() {
                warn!(
                    model = artifact.classifier.name(),
                    inputs = width,
                    features = feature_columns.len(),
                    "Model input width does not match the feature list; scoring will fail"
                );
            }
        }

        info!(
            model = artifact.classifier.name(),
            version = %artifact.version,
            probabilities = supports_probabilities,
            metadata = metadata.is_some(),
            "Model service ready"
        );

        Self {
            artifact,
            metadata,
            feature_columns,
            supports_probabilities,
        }
    }
}

enum ServiceState {
    Loaded(LoadedState),
    FailedToLoad(String),
}

/// Owns the loaded classifier and scores batches of records
pub struct ModelService {
    registry: Option<ArtifactRegistry>,
    state: OnceLock<ServiceState>,
    init_lock: Mutex<()>,
}

impl ModelService {
    /// Create an uninitialized service that will load from `registry`
    pub fn new(registry: ArtifactRegistry) -> Self {
        Self {
            registry: Some(registry),
            state: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Create a service that is already loaded with an in-memory classifier
    pub fn from_classifier(
        classifier: Arc<dyn FraudClassifier>,
        metadata: Option<ModelMetadata>,
        version: impl Into<String>,
    ) -> Self {
        let artifact = ModelArtifact::from_classifier(classifier, version);
        let state = OnceLock::new();
        let _ = state.set(ServiceState::Loaded(LoadedState::new(artifact, metadata)));

        Self {
            registry: None,
            state,
            init_lock: Mutex::new(()),
        }
    }

    /// Scan the artifact store and load the newest artifact.
    ///
    /// Only the first call does any work. Later calls report the outcome of
    /// the first one; a failed load is never retried.
    pub fn init(&self) -> Result<()> {
        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| Error::model_load("model service init lock poisoned"))?;

        if let Some(state) = self.state.get() {
            return match state {
                ServiceState::Loaded(_) => Ok(()),
                ServiceState::FailedToLoad(reason) => Err(Error::model_load(format!(
                    "model service failed to load earlier: {}",
                    reason
                ))),
            };
        }

        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| Error::config("model service has no artifact registry"))?;

        match Self::load(registry) {
            Ok(loaded) => {
                let _ = self.state.set(ServiceState::Loaded(loaded));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Failed to load model");
                let _ = self.state.set(ServiceState::FailedToLoad(e.to_string()));
                Err(e)
            }
        }
    }

    fn load(registry: &ArtifactRegistry) -> Result<LoadedState> {
        let selection = registry.scan()?;
        info!(artifact = %selection.artifact.display(), "Loading model artifact");

        let version = registry.version_tag(&selection.artifact);
        let artifact = ModelArtifact::load(&selection.artifact, version)?;

        let metadata = match &selection.metadata {
            Some(path) => Some(load_metadata(path)?),
            None => {
                warn!("No metadata document found; reporting placeholder model identity");
                None
            }
        };

        Ok(LoadedState::new(artifact, metadata))
    }

    /// Current lifecycle state
    pub fn status(&self) -> ModelStatus {
        match self.state.get() {
            None => ModelStatus::Uninitialized,
            Some(ServiceState::Loaded(_)) => ModelStatus::Loaded,
            Some(ServiceState::FailedToLoad(_)) => ModelStatus::FailedToLoad,
        }
    }

    /// Health predicate: true once a model is loaded, and forever after
    pub fn is_loaded(&self) -> bool {
        self.status() == ModelStatus::Loaded
    }

    /// Metadata document of the loaded model, if one was found
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.loaded().ok().and_then(|s| s.metadata.as_ref())
    }

    /// Version tag of the loaded artifact
    pub fn model_version(&self) -> Option<&str> {
        self.loaded().ok().map(|s| s.artifact.version.as_str())
    }

    /// Name of the loaded classifier
    pub fn model_name(&self) -> Option<&str> {
        self.loaded().ok().map(|s| s.artifact.classifier.name())
    }

    /// Whether results will carry confidence values
    pub fn supports_probabilities(&self) -> bool {
        self.loaded().map_or(false, |s| s.supports_probabilities)
    }

    /// Score records, returning raw labels and optional probabilities
    pub fn infer(&self, records: &[TransactionRecord]) -> Result<Inference> {
        let state = self.loaded()?;
        let classifier = &state.artifact.classifier;
        let start = Instant::now();

        let features = FeatureMatrix::from_records(records, &state.feature_columns)?;

        let predictions = classifier.predict(&features).map_err(as_prediction_error)?;
        if predictions.len() != records.len() {
            return Err(Error::prediction(format!(
                "model returned {} predictions for {} records",
                predictions.len(),
                records.len()
            )));
        }
        if let Some(bad) = predictions.iter().find(|&&p| p > 1) {
            return Err(Error::prediction(format!(
                "model returned non-binary class label {}",
                bad
            )));
        }

        let probabilities = if state.supports_probabilities {
            Some(
                classifier
                    .predict_proba(&features)
                    .map_err(as_prediction_error)?,
            )
        } else {
            None
        };

        let latency_us = start.elapsed().as_micros() as u64;
        debug!(
            model = classifier.name(),
            records = records.len(),
            latency_us,
            "Scored batch"
        );

        Ok(Inference {
            predictions,
            probabilities,
            latency_us,
        })
    }

    /// Score records into per-record results
    pub fn classify(&self, records: &[TransactionRecord]) -> Result<Vec<PredictionResult>> {
        let inference = self.infer(records)?;
        ResponseBuilder::new().results(
            records,
            &inference.predictions,
            inference.probabilities.as_deref(),
        )
    }

    /// Score records into a full response envelope
    pub fn predict(&self, records: &[TransactionRecord]) -> Result<PredictionEnvelope> {
        let inference = self.infer(records)?;
        ResponseBuilder::new().build(
            records,
            &inference.predictions,
            inference.probabilities.as_deref(),
            self.metadata(),
        )
    }

    fn loaded(&self) -> Result<&LoadedState> {
        match self.state.get() {
            Some(ServiceState::Loaded(state)) => Ok(state),
            _ => Err(Error::ModelNotLoaded),
        }
    }
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("status", &self.status())
            .field("model", &self.model_name())
            .field("version", &self.model_version())
            .finish()
    }
}

fn as_prediction_error(e: Error) -> Error {
    match e {
        Error::Prediction(_) => e,
        other => Error::prediction(other.to_string()),
    }
}
