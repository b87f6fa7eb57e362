//! Deterministic stand-in for the Collekto backend.
//!
//! Rows are loaded once from CSV and looked up by exact
//! (`Loan_ID`, `system_id`) match. Nothing here touches the network.

use crate::error::CollektoError;
use std::io;
use std::path::Path;
use tracing::{debug, info};
use voicebot_types::{CustomerRecord, LOAN_ID, SYSTEM_ID};

/// Dataset compiled into the binary, used when no CSV path is configured.
const BUILTIN_DATASET: &str = include_str!("../data/mock_customers.csv");

#[derive(Debug, Clone)]
struct MockRow {
    loan_id: String,
    system_id: String,
    record: CustomerRecord,
}

#[derive(Debug, Clone)]
pub struct CollektoMock {
    rows: Vec<MockRow>,
}

impl CollektoMock {
    /// Loads the built-in dataset.
    pub fn builtin() -> Result<Self, CollektoError> {
        Self::from_reader(BUILTIN_DATASET.as_bytes())
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, CollektoError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CollektoError::MockData(format!("failed to open {}: {}", path.display(), e))
        })?;
        let mock = Self::from_reader(file)?;
        info!(path = %path.display(), rows = mock.len(), "loaded Collekto mock dataset");
        Ok(mock)
    }

    /// Parses CSV with a header row. `Loan_ID` and `system_id` columns are
    /// required.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, CollektoError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| CollektoError::MockData(format!("invalid CSV header: {}", e)))?
            .clone();

        let loan_col = column_index(&headers, LOAN_ID)?;
        let system_col = column_index(&headers, SYSTEM_ID)?;

        let mut rows = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let row = result.map_err(|e| {
                CollektoError::MockData(format!("invalid CSV row {}: {}", line + 1, e))
            })?;
            rows.push(MockRow {
                loan_id: row.get(loan_col).unwrap_or_default().to_string(),
                system_id: row.get(system_col).unwrap_or_default().to_string(),
                record: CustomerRecord::from_flat_strings(headers.iter().zip(row.iter())),
            });
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the matching row, or an empty record when nothing matches.
    pub fn lookup(&self, loan_id: &str, system_id: &str) -> CustomerRecord {
        match self
            .rows
            .iter()
            .find(|row| row.loan_id == loan_id && row.system_id == system_id)
        {
            Some(row) => row.record.clone(),
            None => {
                debug!(loan_id, system_id, rows = self.rows.len(), "no mock customer matched");
                CustomerRecord::new()
            }
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, CollektoError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CollektoError::MockData(format!("missing required column {}", name)))
}
