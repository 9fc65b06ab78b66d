//! Request normalization
//!
//! Turns an inbound body into an ordered sequence of [`TransactionRecord`]s.
//! The check is structural only: a body is one object or an array of
//! objects. Whether the objects carry the fields a model expects is decided
//! later, at scoring time.

use crate::error::{Error, Result};
use crate::types::TransactionRecord;
use serde_json::Value;
use tracing::debug;

/// Normalize a parsed JSON body.
///
/// A single object becomes a one-element sequence. Array order is kept, so
/// the index of each record is its `transaction_id`.
pub fn normalize(body: &Value) -> Result<Vec<TransactionRecord>> {
    let records = match body {
        Value::Null => return Err(Error::invalid_input("No data provided")),
        Value::Object(fields) if fields.is_empty() => {
            return Err(Error::invalid_input("No data provided"))
        }
        Value::Object(fields) => vec![TransactionRecord::new(fields.clone())],
        Value::Array(items) if items.is_empty() => {
            return Err(Error::invalid_input("No data provided"))
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(fields) => Ok(TransactionRecord::new(fields.clone())),
                other => Err(Error::invalid_input(format!(
                    "Invalid data format: element {} is {}, expected an object",
                    idx,
                    json_type(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(Error::invalid_input(format!(
                "Invalid data format: expected an object or an array of objects, got {}",
                json_type(other)
            )))
        }
    };

    debug!(records = records.len(), "Normalized request body");
    Ok(records)
}

/// Normalize raw request bytes.
///
/// Empty bodies and malformed JSON are reported as invalid input.
pub fn normalize_slice(bytes: &[u8]) -> Result<Vec<TransactionRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::invalid_input("No data provided"));
    }

    let body: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_input(format!("Malformed JSON body: {}", e)))?;

    normalize(&body)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "Gender": 1, "Age": 35, "HouseTypeID": 2, "ContactAvaliabilityID": 1,
            "HomeCountry": 1, "AccountNo": 12345, "CardExpiryDate": 202512,
            "TransactionAmount": 89.99, "TransactionCountry": 1, "LargePurchase": 0,
            "ProductID": 1, "CIF": 67890, "TransactionCurrencyCode": 1
        })
    }

    fn assert_invalid(result: Result<Vec<TransactionRecord>>) {
        match result {
            Err(Error::InvalidInput(_)) => {}
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn single_object_is_wrapped() {
        let single = normalize(&sample()).unwrap();
        let wrapped = normalize(&json!([sample()])).unwrap();

        assert_eq!(single.len(), 1);
        assert_eq!(single, wrapped);
    }

    #[test]
    fn array_order_is_preserved() {
        let mut second = sample();
        second["TransactionAmount"] = json!(4999.0);
        let records = normalize(&json!([sample(), second])).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].numeric("TransactionAmount"), Some(89.99));
        assert_eq!(records[1].numeric("TransactionAmount"), Some(4999.0));
    }

    #[test]
    fn empty_and_null_bodies_are_rejected() {
        assert_invalid(normalize(&Value::Null));
        assert_invalid(normalize(&json!([])));
        assert_invalid(normalize(&json!({})));
    }

    #[test]
    fn scalar_bodies_are_rejected() {
        assert_invalid(normalize(&json!("not-an-object")));
        assert_invalid(normalize(&json!(42)));
        assert_invalid(normalize(&json!(true)));
    }

    #[test]
    fn non_object_elements_are_rejected() {
        assert_invalid(normalize(&json!([sample(), "oops"])));
        assert_invalid(normalize(&json!([[1, 2, 3]])));
    }

    #[test]
    fn schema_is_not_checked() {
        let records = normalize(&json!({"unexpected": "value"})).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("unexpected"), Some(&json!("value")));
    }

    #[test]
    fn raw_bytes() {
        assert_invalid(normalize_slice(b""));
        assert_invalid(normalize_slice(b"  \n"));
        assert_invalid(normalize_slice(b"{\"Age\": "));
        assert_invalid(normalize_slice(b"null"));

        let records = normalize_slice(br#"[{"Age": 35}, {"Age": 40}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }
}
