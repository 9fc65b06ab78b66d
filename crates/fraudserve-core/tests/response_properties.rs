//! Property tests for normalization and envelope assembly

use fraudserve_core::response::PROBABILITY_TOLERANCE;
use fraudserve_core::{normalize, PredictionLabel, ResponseBuilder, TransactionRecord};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn record_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (0u32..2, 18u32..90, 0.0f64..10_000.0).prop_map(|(gender, age, amount)| {
        let mut fields = Map::new();
        fields.insert("Gender".to_string(), json!(gender));
        fields.insert("Age".to_string(), json!(age));
        fields.insert("TransactionAmount".to_string(), json!(amount));
        fields
    })
}

fn batch_strategy() -> impl Strategy<Value = Vec<(Map<String, Value>, u8, f64)>> {
    prop::collection::vec((record_strategy(), 0u8..2, 0.0f64..=1.0), 1..32)
}

proptest! {
    #[test]
    fn results_are_index_aligned(batch in batch_strategy()) {
        let body = Value::Array(batch.iter().map(|(r, _, _)| Value::Object(r.clone())).collect());
        let records = normalize(&body).unwrap();
        let predictions: Vec<u8> = batch.iter().map(|(_, p, _)| *p).collect();

        let results = ResponseBuilder::new().results(&records, &predictions, None).unwrap();

        prop_assert_eq!(results.len(), batch.len());
        for (idx, result) in results.iter().enumerate() {
            prop_assert_eq!(result.transaction_id, idx);
            prop_assert_eq!(result.prediction, predictions[idx]);
            prop_assert_eq!(&records[idx], &TransactionRecord::new(batch[idx].0.clone()));
        }
    }

    #[test]
    fn label_is_fraud_iff_prediction_is_one(batch in batch_strategy()) {
        let records: Vec<_> = batch.iter().map(|(r, _, _)| TransactionRecord::new(r.clone())).collect();
        let predictions: Vec<u8> = batch.iter().map(|(_, p, _)| *p).collect();

        let results = ResponseBuilder::new().results(&records, &predictions, None).unwrap();

        for result in results {
            prop_assert_eq!(
                result.prediction_label == PredictionLabel::Fraud,
                result.prediction == 1
            );
        }
    }

    #[test]
    fn confidence_sums_to_one(batch in batch_strategy()) {
        let records: Vec<_> = batch.iter().map(|(r, _, _)| TransactionRecord::new(r.clone())).collect();
        let predictions: Vec<u8> = batch.iter().map(|(_, p, _)| *p).collect();
        let probabilities: Vec<[f64; 2]> = batch.iter().map(|(_, _, p)| [1.0 - p, *p]).collect();

        let results = ResponseBuilder::new()
            .results(&records, &predictions, Some(&probabilities))
            .unwrap();

        for (idx, result) in results.iter().enumerate() {
            let confidence = result.confidence.expect("confidence present");
            prop_assert!((confidence.fraud + confidence.no_fraud - 1.0).abs() <= PROBABILITY_TOLERANCE);
            prop_assert_eq!(confidence.fraud, probabilities[idx][1]);
            prop_assert_eq!(confidence.no_fraud, probabilities[idx][0]);
        }
    }

    #[test]
    fn wrapping_a_single_object_is_idempotent(record in record_strategy()) {
        let single = normalize(&Value::Object(record.clone())).unwrap();
        let wrapped = normalize(&json!([Value::Object(record)])).unwrap();
        prop_assert_eq!(single, wrapped);
    }
}
