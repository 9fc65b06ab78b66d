//! Response envelope assembly

use crate::error::{Error, Result};
use crate::types::{
    Confidence, ModelInfo, ModelMetadata, PredictionEnvelope, PredictionLabel, PredictionResult,
    TransactionRecord,
};
use chrono::{DateTime, Utc};

/// Allowed drift of a probability pair from summing to 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Assembles per-record predictions and model identity into an envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseBuilder {
    timestamp: Option<DateTime<Utc>>,
}

impl ResponseBuilder {
    /// Builder that stamps responses with the current time
    pub fn new() -> Self {
        Self { timestamp: None }
    }

    /// Builder that stamps responses with a fixed time
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }

    /// Build the full envelope
    pub fn build(
        &self,
        records: &[TransactionRecord],
        predictions: &[u8],
        probabilities: Option<&[[f64; 2]]>,
        metadata: Option<&ModelMetadata>,
    ) -> Result<PredictionEnvelope> {
        let timestamp = self.now();
        let predictions = self.results_at(records, predictions, probabilities, timestamp)?;

        Ok(PredictionEnvelope {
            predictions,
            model_info: ModelInfo::from_metadata(metadata),
            timestamp,
        })
    }

    /// Build only the per-record results
    pub fn results(
        &self,
        records: &[TransactionRecord],
        predictions: &[u8],
        probabilities: Option<&[[f64; 2]]>,
    ) -> Result<Vec<PredictionResult>> {
        self.results_at(records, predictions, probabilities, self.now())
    }

    fn results_at(
        &self,
        records: &[TransactionRecord],
        predictions: &[u8],
        probabilities: Option<&[[f64; 2]]>,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<PredictionResult>> {
        if predictions.len() != records.len() {
            return Err(Error::prediction(format!(
                "model returned {} predictions for {} records",
                predictions.len(),
                records.len()
            )));
        }

        if let Some(rows) = probabilities {
            if rows.len() != records.len() {
                return Err(Error::prediction(format!(
                    "model returned {} probability rows for {} records",
                    rows.len(),
                    records.len()
                )));
            }
        }

        predictions
            .iter()
            .enumerate()
            .map(|(idx, &prediction)| {
                let confidence = probabilities
                    .map(|rows| to_confidence(idx, rows[idx]))
                    .transpose()?;

                Ok(PredictionResult {
                    transaction_id: idx,
                    prediction,
                    prediction_label: PredictionLabel::from_prediction(prediction),
                    confidence,
                    timestamp,
                })
            })
            .collect()
    }

    fn now(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}

fn to_confidence(idx: usize, row: [f64; 2]) -> Result<Confidence> {
    let [no_fraud, fraud] = row;
    let in_range = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);

    if !in_range(no_fraud)
        || !in_range(fraud)
        || (no_fraud + fraud - 1.0).abs() > PROBABILITY_TOLERANCE
    {
        return Err(Error::prediction(format!(
            "invalid probability estimate for record {}: [{}, {}]",
            idx, no_fraud, fraud
        )));
    }

    Ok(Confidence { no_fraud, fraud })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn records(n: usize) -> Vec<TransactionRecord> {
        (0..n)
            .map(|i| {
                let mut fields = Map::new();
                fields.insert("Age".to_string(), Value::from(30 + i as u64));
                TransactionRecord::new(fields)
            })
            .collect()
    }

    #[test]
    fn reference_record_scenario() {
        let ts = Utc::now();
        let envelope = ResponseBuilder::at(ts)
            .build(&records(1), &[0], Some(&[[0.95, 0.05]]), None)
            .unwrap();

        let first = &envelope.predictions[0];
        assert_eq!(first.transaction_id, 0);
        assert_eq!(first.prediction, 0);
        assert_eq!(first.prediction_label, PredictionLabel::NoFraud);
        assert_eq!(
            first.confidence,
            Some(Confidence {
                no_fraud: 0.95,
                fraud: 0.05
            })
        );
        assert_eq!(first.timestamp, ts);
        assert_eq!(envelope.timestamp, ts);
    }

    #[test]
    fn confidence_is_omitted_without_probabilities() {
        let envelope = ResponseBuilder::new()
            .build(&records(2), &[1, 0], None, None)
            .unwrap();

        let value = serde_json::to_value(&envelope).unwrap();
        let first = &value["predictions"][0];
        assert_eq!(first["prediction_label"], json!("fraud"));
        assert!(first.get("confidence").is_none());
        assert_eq!(value["predictions"][1]["transaction_id"], json!(1));
    }

    #[test]
    fn model_info_comes_from_metadata() {
        let metadata = ModelMetadata {
            name: Some("GradientBoosting".to_string()),
            f1_score: Some(0.87),
            ..Default::default()
        };

        let envelope = ResponseBuilder::new()
            .build(&records(1), &[1], None, Some(&metadata))
            .unwrap();
        assert_eq!(envelope.model_info.name, "GradientBoosting");
        assert_eq!(envelope.model_info.f1_score, 0.87);

        let envelope = ResponseBuilder::new()
            .build(&records(1), &[1], None, None)
            .unwrap();
        assert_eq!(envelope.model_info.name, "Unknown");
        assert_eq!(envelope.model_info.f1_score, 0.0);
    }

    #[test]
    fn length_mismatch_is_a_prediction_error() {
        let result = ResponseBuilder::new().build(&records(2), &[1], None, None);
        assert!(matches!(result, Err(Error::Prediction(_))));

        let result = ResponseBuilder::new().build(&records(2), &[1, 0], Some(&[[0.5, 0.5]]), None);
        assert!(matches!(result, Err(Error::Prediction(_))));
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        let result = ResponseBuilder::new().results(&records(1), &[1], Some(&[[0.7, 0.7]]));
        assert!(matches!(result, Err(Error::Prediction(_))));

        let result = ResponseBuilder::new().results(&records(1), &[1], Some(&[[f64::NAN, 1.0]]));
        assert!(matches!(result, Err(Error::Prediction(_))));
    }
}
