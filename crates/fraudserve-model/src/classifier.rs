//! Classifier trait and common types

use crate::features::FeatureMatrix;
use fraudserve_core::{Error, Result};

/// Trait for all fraud classifiers
///
/// Scoring is synchronous CPU work; implementations must be safe to call
/// from many threads at once without interior mutation.
pub trait FraudClassifier: Send + Sync {
    /// Get the classifier name
    fn name(&self) -> &str;

    /// Number of input columns the model was trained on, if known
    fn input_width(&self) -> Option<usize> {
        None
    }

    /// Class label (0 or 1) for every row
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>>;

    /// Whether [`FraudClassifier::predict_proba`] is available
    fn supports_probabilities(&self) -> bool {
        false
    }

    /// `[p(no_fraud), p(fraud)]` for every row
    fn predict_proba(&self, _features: &FeatureMatrix) -> Result<Vec<[f64; 2]>> {
        Err(Error::prediction(format!(
            "classifier '{}' does not provide probability estimates",
            self.name()
        )))
    }
}

/// Raw output of one scoring call
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Class labels, index-aligned with the input records
    pub predictions: Vec<u8>,

    /// Probability pairs, present only for probabilistic models
    pub probabilities: Option<Vec<[f64; 2]>>,

    /// Latency in microseconds
    pub latency_us: u64,
}
