//! Error types for fraudserve

/// Result type alias using fraudserve's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fraudserve operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No artifact in the store matched the naming convention
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Request body had the wrong structure
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Scoring was requested before a model was loaded (or after loading failed)
    #[error("model not loaded")]
    ModelNotLoaded,

    /// The classifier failed while scoring a batch
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// An artifact or metadata document could not be deserialized
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new artifact-not-found error
    pub fn artifact_not_found(msg: impl Into<String>) -> Self {
        Self::ArtifactNotFound(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new prediction error carrying the raw diagnostic
    pub fn prediction(detail: impl Into<String>) -> Self {
        Self::Prediction(detail.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable identifier for the error category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::ModelNotLoaded => "model_not_loaded",
            Self::Prediction(_) => "prediction_error",
            Self::ModelLoad(_) => "model_load_error",
            Self::Config(_) => "configuration_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Human-readable message that is safe to hand to API clients.
    ///
    /// Prediction failures get a generic message; the raw text is available
    /// separately through [`Error::detail`].
    pub fn public_message(&self) -> String {
        match self {
            Self::Prediction(_) => "Error during prediction".to_string(),
            Self::ModelNotLoaded => "Model not loaded".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Raw diagnostic text, if this error carries one separate from its message
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Prediction(detail) => Some(detail),
            _ => None,
        }
    }
}
