//! Model loading for candle-backed fraud classifiers
//!
//! An artifact is a safetensors file. Its tensor names decide which
//! estimator it holds:
//!
//! - `logistic.weight (1, n)`, `logistic.bias (1)`: logistic regression
//! - `svm.weight (1, n)`, `svm.bias (1)`: linear margin classifier, no probabilities
//! - `mlp.hidden.{weight,bias}`, `mlp.output.{weight,bias}`: one hidden ReLU layer
//!   with a two-class softmax head
//!
//! Parameters are widened to f64 on load and scoring runs in f64.

use crate::classifier::FraudClassifier;
use crate::features::FeatureMatrix;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module};
use fraudserve_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Estimator families recognised from an artifact's tensor names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorKind {
    /// Sigmoid over a linear score
    LogisticRegression,
    /// Sign of a linear decision function
    LinearMargin,
    /// One hidden ReLU layer and a softmax head
    Perceptron,
}

impl EstimatorKind {
    /// Short identifier used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::LinearMargin => "linear_margin",
            Self::Perceptron => "perceptron",
        }
    }

    /// Whether the estimator can produce probability estimates
    pub fn has_probabilities(&self) -> bool {
        !matches!(self, Self::LinearMargin)
    }
}

#[derive(Debug, Clone)]
enum Estimator {
    Logistic(Linear),
    LinearMargin(Linear),
    Perceptron { hidden: Linear, output: Linear },
}

impl Estimator {
    fn from_tensors(tensors: &mut HashMap<String, Tensor>) -> Result<Self> {
        if tensors.contains_key("logistic.weight") {
            Ok(Self::Logistic(take_linear(tensors, "logistic", Some(1))?))
        } else if tensors.contains_key("svm.weight") {
            Ok(Self::LinearMargin(take_linear(tensors, "svm", Some(1))?))
        } else if tensors.contains_key("mlp.hidden.weight") {
            let hidden = take_linear(tensors, "mlp.hidden", None)?;
            let output = take_linear(tensors, "mlp.output", Some(2))?;

            let hidden_size = hidden.weight().dim(0).map_err(load_error)?;
            let output_in = output.weight().dim(1).map_err(load_error)?;
            if hidden_size != output_in {
                return Err(Error::model_load(format!(
                    "mlp.output expects {} inputs but mlp.hidden produces {}",
                    output_in, hidden_size
                )));
            }

            Ok(Self::Perceptron { hidden, output })
        } else {
            let mut names: Vec<_> = tensors.keys().cloned().collect();
            names.sort();
            Err(Error::model_load(format!(
                "Unrecognized tensor layout: {:?}",
                names
            )))
        }
    }

    fn kind(&self) -> EstimatorKind {
        match self {
            Self::Logistic(_) => EstimatorKind::LogisticRegression,
            Self::LinearMargin(_) => EstimatorKind::LinearMargin,
            Self::Perceptron { .. } => EstimatorKind::Perceptron,
        }
    }

    fn input_width(&self) -> Option<usize> {
        let first = match self {
            Self::Logistic(linear) | Self::LinearMargin(linear) => linear,
            Self::Perceptron { hidden, .. } => hidden,
        };
        first.weight().dim(1).ok()
    }

    /// Per-row probability of the fraud class
    fn fraud_probability(&self, x: &Tensor) -> candle_core::Result<Option<Vec<f64>>> {
        match self {
            Self::Logistic(linear) => {
                let scores = linear.forward(x)?;
                let probs = candle_nn::ops::sigmoid(&scores)?;
                Ok(Some(probs.flatten_all()?.to_vec1::<f64>()?))
            }
            Self::LinearMargin(_) => Ok(None),
            Self::Perceptron { hidden, output } => {
                let activations = hidden.forward(x)?.relu()?;
                let logits = output.forward(&activations)?;
                let probs = candle_nn::ops::softmax(&logits, D::Minus1)?;
                Ok(Some(
                    probs
                        .to_vec2::<f64>()?
                        .into_iter()
                        .map(|row| row[1])
                        .collect(),
                ))
            }
        }
    }

    fn predict(&self, x: &Tensor) -> candle_core::Result<Vec<u8>> {
        match self {
            Self::LinearMargin(linear) => {
                let decision = linear.forward(x)?.flatten_all()?.to_vec1::<f64>()?;
                Ok(decision.into_iter().map(|d| u8::from(d > 0.0)).collect())
            }
            _ => {
                let probs = self.fraud_probability(x)?.unwrap_or_default();
                Ok(probs.into_iter().map(|p| u8::from(p > 0.5)).collect())
            }
        }
    }
}

/// Classifier backed by parameters loaded from a safetensors artifact
#[derive(Debug)]
pub struct CandleClassifier {
    name: String,
    estimator: Estimator,
    device: Device,
    weights_path: PathBuf,
}

impl CandleClassifier {
    /// Load a classifier from a safetensors file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::Cpu;

        let mut tensors = candle_core::safetensors::load(path, &device).map_err(|e| {
            Error::model_load(format!("Failed to read artifact {}: {}", path.display(), e))
        })?;

        let estimator = Estimator::from_tensors(&mut tensors)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        info!(
            model = %name,
            kind = estimator.kind().as_str(),
            inputs = ?estimator.input_width(),
            "Loaded model artifact"
        );

        Ok(Self {
            name,
            estimator,
            device,
            weights_path: path.to_path_buf(),
        })
    }

    /// Estimator family held by this artifact
    pub fn kind(&self) -> EstimatorKind {
        self.estimator.kind()
    }

    /// Path the weights were loaded from
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    fn to_tensor(&self, features: &FeatureMatrix) -> Result<Tensor> {
        Tensor::from_slice(
            features.values(),
            (features.rows(), features.cols()),
            &self.device,
        )
        .map_err(prediction_error)
    }
}

impl FraudClassifier for CandleClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        self.estimator.input_width()
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        let x = self.to_tensor(features)?;
        let predictions = self.estimator.predict(&x).map_err(prediction_error)?;
        debug!(model = %self.name, rows = predictions.len(), "Predicted batch");
        Ok(predictions)
    }

    fn supports_probabilities(&self) -> bool {
        self.estimator.kind().has_probabilities()
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>> {
        let x = self.to_tensor(features)?;
        let probs = self
            .estimator
            .fraud_probability(&x)
            .map_err(prediction_error)?
            .ok_or_else(|| {
                Error::prediction(format!(
                    "classifier '{}' does not provide probability estimates",
                    self.name
                ))
            })?;

        Ok(probs
            .into_iter()
            .map(|p| [1.0 - p, p])
            .collect())
    }
}

/// A loaded classifier together with the version tag of its artifact
#[derive(Clone)]
pub struct ModelArtifact {
    /// The classifier, read-only after load
    pub classifier: Arc<dyn FraudClassifier>,

    /// Version tag derived from the artifact file name
    pub version: String,

    /// Where the artifact was read from, if it came from disk
    pub path: Option<PathBuf>,
}

impl ModelArtifact {
    /// Load an artifact file and tag it with a version
    pub fn load(path: impl AsRef<Path>, version: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let classifier = CandleClassifier::load(path)?;

        Ok(Self {
            classifier: Arc::new(classifier),
            version: version.into(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory classifier
    pub fn from_classifier(
        classifier: Arc<dyn FraudClassifier>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            version: version.into(),
            path: None,
        }
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("classifier", &self.classifier.name())
            .field("version", &self.version)
            .field("path", &self.path)
            .finish()
    }
}

fn take_linear(
    tensors: &mut HashMap<String, Tensor>,
    prefix: &str,
    out_features: Option<usize>,
) -> Result<Linear> {
    let weight = take_tensor(tensors, &format!("{}.weight", prefix))?;
    let bias = take_tensor(tensors, &format!("{}.bias", prefix))?;

    let (rows, _) = weight.dims2().map_err(|e| {
        Error::model_load(format!("{}.weight must be a matrix: {}", prefix, e))
    })?;
    let bias_len = bias
        .dims1()
        .map_err(|e| Error::model_load(format!("{}.bias must be a vector: {}", prefix, e)))?;

    if let Some(expected) = out_features {
        if rows != expected {
            return Err(Error::model_load(format!(
                "{}.weight has {} output rows, expected {}",
                prefix, rows, expected
            )));
        }
    }
    if bias_len != rows {
        return Err(Error::model_load(format!(
            "{}.bias has {} entries for {} output rows",
            prefix, bias_len, rows
        )));
    }

    Ok(Linear::new(weight, Some(bias)))
}

fn take_tensor(tensors: &mut HashMap<String, Tensor>, name: &str) -> Result<Tensor> {
    tensors
        .remove(name)
        .ok_or_else(|| Error::model_load(format!("Missing tensor '{}'", name)))?
        .to_dtype(DType::F64)
        .map_err(|e| Error::model_load(format!("Failed to convert '{}' to f64: {}", name, e)))
}

fn load_error(e: candle_core::Error) -> Error {
    Error::model_load(e.to_string())
}

fn prediction_error(e: candle_core::Error) -> Error {
    Error::prediction(e.to_string())
}
