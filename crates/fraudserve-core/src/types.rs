//! Core types for fraudserve

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical transaction fields, in the order models are trained on
pub const FEATURE_COLUMNS: [&str; 13] = [
    "Gender",
    "Age",
    "HouseTypeID",
    "ContactAvaliabilityID",
    "HomeCountry",
    "AccountNo",
    "CardExpiryDate",
    "TransactionAmount",
    "TransactionCountry",
    "LargePurchase",
    "ProductID",
    "CIF",
    "TransactionCurrencyCode",
];

/// One transaction as submitted by a client.
///
/// Field names and value types are not checked here; the classifier
/// rejects records it cannot vectorize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRecord {
    fields: Map<String, Value>,
}

impl TransactionRecord {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Numeric value of a field; booleans count as 0/1
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Field names in submission order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for TransactionRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Human-readable outcome of a binary prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionLabel {
    Fraud,
    NoFraud,
}

impl PredictionLabel {
    /// `Fraud` iff the class label is 1
    pub fn from_prediction(prediction: u8) -> Self {
        if prediction == 1 {
            Self::Fraud
        } else {
            Self::NoFraud
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fraud => "fraud",
            Self::NoFraud => "no_fraud",
        }
    }
}

/// Probability pair over the binary outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub no_fraud: f64,
    pub fraud: f64,
}

/// Scoring result for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Position of the record in the submitted batch
    pub transaction_id: usize,

    /// Class label, 0 or 1
    pub prediction: u8,

    /// Derived from `prediction`
    pub prediction_label: PredictionLabel,

    /// Absent when the model has no probability estimates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,

    pub timestamp: DateTime<Utc>,
}

/// Identity of the model that produced a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub f1_score: f64,
}

impl ModelInfo {
    /// Placeholder name used when no metadata document was found
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Derive identity from optional metadata
    pub fn from_metadata(metadata: Option<&ModelMetadata>) -> Self {
        Self {
            name: metadata
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| Self::UNKNOWN_NAME.to_string()),
            f1_score: metadata.and_then(|m| m.f1_score).unwrap_or(0.0),
        }
    }
}

/// Full response payload for a scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEnvelope {
    pub predictions: Vec<PredictionResult>,
    pub model_info: ModelInfo,
    pub timestamp: DateTime<Utc>,
}

/// Metadata document written next to a model artifact.
///
/// Identity fields are read leniently: a value of the wrong type is kept
/// verbatim in `extra` and the typed field stays empty, so the document is
/// still echoed as written. An empty `features` list is kept the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ModelMetadata {
    /// Model name, stored as `model_name` on disk
    #[serde(rename = "model_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Feature names in training order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,

    /// Any other keys in the document
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ModelMetadata {
    fn from(mut doc: Map<String, Value>) -> Self {
        let name = take_if(&mut doc, "model_name", |v| v.as_str().map(str::to_string));
        let f1_score = take_if(&mut doc, "f1_score", Value::as_f64);
        let accuracy = take_if(&mut doc, "accuracy", Value::as_f64);
        let features = take_if(&mut doc, "features", |v| {
            let list = v.as_array().filter(|list| !list.is_empty())?;
            list.iter()
                .map(|f| f.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_default();

        Self {
            name,
            f1_score,
            accuracy,
            features,
            extra: doc,
        }
    }
}

/// Remove `key` from the document only if `convert` accepts its value
fn take_if<T>(
    doc: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = doc.get(key).and_then(convert)?;
    doc.remove(key);
    Some(value)
}

impl ModelMetadata {
    /// Keys with a fixed meaning
    pub const IDENTITY_KEYS: [&'static str; 4] = ["model_name", "f1_score", "accuracy", "features"];

    /// Identity keys present in the document with a value of the wrong type
    pub fn mistyped_keys(&self) -> Vec<&'static str> {
        Self::IDENTITY_KEYS
            .into_iter()
            .filter(|key| match self.extra.get(*key) {
                Some(Value::Array(list)) => !list.is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            })
            .collect()
    }

    /// Column order to vectorize records with: the recorded feature list,
    /// or the canonical order when none was recorded.
    pub fn feature_columns(metadata: Option<&ModelMetadata>) -> Vec<String> {
        match metadata {
            Some(m) if !m.features.is_empty() => m.features.clone(),
            _ => FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_follows_prediction() {
        assert_eq!(PredictionLabel::from_prediction(1), PredictionLabel::Fraud);
        assert_eq!(PredictionLabel::from_prediction(0), PredictionLabel::NoFraud);
        assert_eq!(
            serde_json::to_value(PredictionLabel::NoFraud).unwrap(),
            json!("no_fraud")
        );
    }

    #[test]
    fn record_numeric_accessor() {
        let record: TransactionRecord = serde_json::from_value(json!({
            "Age": 35,
            "TransactionAmount": 89.99,
            "LargePurchase": true,
            "Gender": "1"
        }))
        .unwrap();

        assert_eq!(record.numeric("Age"), Some(35.0));
        assert_eq!(record.numeric("TransactionAmount"), Some(89.99));
        assert_eq!(record.numeric("LargePurchase"), Some(1.0));
        assert_eq!(record.numeric("Gender"), None);
        assert_eq!(record.numeric("CIF"), None);
    }

    #[test]
    fn metadata_keeps_unknown_keys() {
        let doc = json!({
            "model_name": "RandomForest",
            "f1_score": 0.91,
            "accuracy": 0.97,
            "features": ["Gender", "Age"],
            "training_date": "2024-06-01"
        });

        let metadata: ModelMetadata = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("RandomForest"));
        assert_eq!(metadata.features.len(), 2);
        assert_eq!(serde_json::to_value(&metadata).unwrap(), doc);
    }

    #[test]
    fn mistyped_identity_fields_fall_back() {
        let doc = json!({
            "model_name": 42,
            "f1_score": "0.87",
            "accuracy": 0.97,
            "features": "Age"
        });

        let metadata: ModelMetadata = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(metadata.name, None);
        assert_eq!(metadata.f1_score, None);
        assert_eq!(metadata.accuracy, Some(0.97));
        assert!(metadata.features.is_empty());
        assert_eq!(metadata.mistyped_keys(), vec!["model_name", "f1_score", "features"]);

        let info = ModelInfo::from_metadata(Some(&metadata));
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.f1_score, 0.0);
        assert_eq!(ModelMetadata::feature_columns(Some(&metadata)).len(), 13);

        // Echoed exactly as written
        assert_eq!(serde_json::to_value(&metadata).unwrap(), doc);
    }

    #[test]
    fn model_info_defaults_without_metadata() {
        let info = ModelInfo::from_metadata(None);
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.f1_score, 0.0);
    }

    #[test]
    fn feature_columns_fall_back_to_canonical_order() {
        let columns = ModelMetadata::feature_columns(None);
        assert_eq!(columns.len(), 13);
        assert_eq!(columns[0], "Gender");

        let empty = ModelMetadata::default();
        assert_eq!(ModelMetadata::feature_columns(Some(&empty)).len(), 13);

        let custom = ModelMetadata {
            features: vec!["Age".to_string()],
            ..Default::default()
        };
        assert_eq!(ModelMetadata::feature_columns(Some(&custom)), vec!["Age"]);
    }
}
