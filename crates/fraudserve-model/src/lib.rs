//! fraudserve Model
//!
//! Artifact discovery and inference for the fraud classifier.
//!
//! - [`registry`] picks the newest artifact and metadata document from a directory
//! - [`model_loader`] turns a safetensors artifact into a candle-backed classifier
//! - [`features`] vectorizes transaction records in the model's column order
//! - [`service`] owns the loaded model and scores batches
//!
//! All scoring runs on CPU.

pub mod classifier;
pub mod config;
pub mod features;
pub mod model_loader;
pub mod registry;
pub mod service;

pub use classifier::{FraudClassifier, Inference};
pub use config::RegistryConfig;
pub use features::FeatureMatrix;
pub use model_loader::{CandleClassifier, EstimatorKind, ModelArtifact};
pub use registry::{load_metadata, scan_directory, ArtifactRegistry, ArtifactSelection};
pub use service::{ModelService, ModelStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::FraudClassifier;
    pub use crate::config::RegistryConfig;
    pub use crate::registry::ArtifactRegistry;
    pub use crate::service::{ModelService, ModelStatus};
}
