//! Record vectorization
//!
//! Builds the dense row-major matrix a classifier consumes. Values stay in
//! f64 so large identifiers keep every digit. Records that do not line up
//! with the column list fail here with a prediction error.

use fraudserve_core::{Error, Result, TransactionRecord};

/// Dense `rows x cols` feature matrix in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Vectorize records using the given column order
    pub fn from_records(records: &[TransactionRecord], columns: &[String]) -> Result<Self> {
        let mut values = Vec::with_capacity(records.len() * columns.len());

        for (idx, record) in records.iter().enumerate() {
            if let Some(unknown) = record
                .field_names()
                .find(|name| !columns.iter().any(|c| c == name))
            {
                return Err(Error::prediction(format!(
                    "record {} has unexpected feature '{}'; expected {:?}",
                    idx, unknown, columns
                )));
            }

            for column in columns {
                let value = match (record.get(column), record.numeric(column)) {
                    (None, _) => {
                        return Err(Error::prediction(format!(
                            "record {} is missing feature '{}'",
                            idx, column
                        )))
                    }
                    (Some(raw), None) => {
                        return Err(Error::prediction(format!(
                            "record {} feature '{}' is not numeric: {}",
                            idx, column, raw
                        )))
                    }
                    (Some(_), Some(v)) => v,
                };
                values.push(value);
            }
        }

        Ok(Self {
            columns: columns.to_vec(),
            rows: records.len(),
            values,
        })
    }

    /// Build a matrix from pre-vectorized values
    pub fn from_values(columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if columns.is_empty() || values.len() % columns.len() != 0 {
            return Err(Error::prediction(format!(
                "{} values do not fill rows of {} columns",
                values.len(),
                columns.len()
            )));
        }

        Ok(Self {
            rows: values.len() / columns.len(),
            columns,
            values,
        })
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Flat row-major values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// A single row
    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        let cols = self.cols();
        self.values.get(idx * cols..(idx + 1) * cols)
    }
}
