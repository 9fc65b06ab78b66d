//! fraudserve Core
//!
//! Core types, traits, and utilities shared across fraudserve components.
//!
//! This crate provides:
//! - The transaction record and prediction data model
//! - Error types and result handling
//! - Request normalization (single object or batch into ordered records)
//! - Response envelope assembly

pub mod error;
pub mod normalize;
pub mod response;
pub mod types;

pub use error::{Error, Result};
pub use normalize::{normalize, normalize_slice};
pub use response::ResponseBuilder;
pub use types::{
    Confidence, ModelInfo, ModelMetadata, PredictionEnvelope, PredictionLabel, PredictionResult,
    TransactionRecord, FEATURE_COLUMNS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::normalize::normalize;
    pub use crate::response::ResponseBuilder;
    pub use crate::types::{
        ModelMetadata, PredictionEnvelope, PredictionResult, TransactionRecord,
    };
}
