// CSV ingestion: raw rows -> validated TransactionRecords
// Row-level failures are recovered and reported; duplicate ids abort the run.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::record::{parse_timestamp, TransactionRecord};

/// Columns every input file must declare in its header row.
/// Extra columns are ignored.
const REQUIRED_COLUMNS: &[&str] = &[
    "transaction_id",
    "customer_id",
    "timestamp",
    "amount",
    "location",
    "merchant_category",
];

// ============================================================================
// RAW ROW
// ============================================================================

/// One CSV row before validation. Everything is a string at this stage;
/// normalization turns it into a TransactionRecord or a row-level error.
#[derive(Debug, Deserialize)]
struct RawRecord {
    transaction_id: String,
    customer_id: String,
    timestamp: String,
    amount: String,
    location: String,
    merchant_category: String,
}

impl RawRecord {
    fn normalize(self) -> Result<TransactionRecord> {
        let transaction_id = self.transaction_id.trim().to_string();
        if transaction_id.is_empty() {
            bail!("missing transaction_id");
        }

        let customer_id = self.customer_id.trim().to_string();
        if customer_id.is_empty() {
            bail!("missing customer_id");
        }

        let location = self.location.trim().to_string();
        if location.is_empty() {
            bail!("missing location");
        }

        let timestamp = parse_timestamp(&self.timestamp)?;

        let raw_amount = self.amount.trim();
        if raw_amount.is_empty() {
            bail!("missing amount");
        }
        let amount: f64 = raw_amount
            .parse()
            .map_err(|_| anyhow!("non-numeric amount '{}'", raw_amount))?;
        if !amount.is_finite() || amount < 0.0 {
            bail!("amount must be a non-negative number, got '{}'", raw_amount);
        }

        Ok(TransactionRecord {
            transaction_id,
            customer_id,
            timestamp,
            amount,
            location,
            merchant_category: self.merchant_category.trim().to_string(),
        })
    }
}

// ============================================================================
// INGEST REPORT
// ============================================================================

/// A row that failed to parse. The row is excluded from the run but
/// surfaced to the caller rather than silently dropped.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    pub message: String,
}

/// Outcome of ingesting one source: the accepted records plus every
/// row that was skipped.
#[derive(Debug)]
pub struct IngestReport {
    pub records: Vec<TransactionRecord>,
    pub skipped: Vec<SkippedRow>,
}

// ============================================================================
// LOADING
// ============================================================================

/// Load records from a CSV file at `path`.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<IngestReport> {
    let reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open input CSV: {:?}", path.as_ref()))?;
    ingest(reader)
}

/// Load records from any reader producing CSV text with a header row.
pub fn load_records_from_reader<R: io::Read>(source: R) -> Result<IngestReport> {
    ingest(csv::Reader::from_reader(source))
}

fn ingest<R: io::Read>(mut reader: csv::Reader<R>) -> Result<IngestReport> {
    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == *column) {
            bail!("input is missing mandatory column '{}'", column);
        }
    }

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    // transaction_id -> line it was first seen on
    let mut seen_ids: HashMap<String, usize> = HashMap::new();

    for (index, row) in reader.deserialize::<RawRecord>().enumerate() {
        let line = index + 2; // line 1 is the header

        let record = match row.map_err(anyhow::Error::from).and_then(RawRecord::normalize) {
            Ok(record) => record,
            Err(err) => {
                skipped.push(SkippedRow {
                    line,
                    message: err.to_string(),
                });
                continue;
            }
        };

        if let Some(first_line) = seen_ids.get(&record.transaction_id) {
            bail!(
                "duplicate transaction_id '{}' (lines {} and {})",
                record.transaction_id,
                first_line,
                line
            );
        }
        seen_ids.insert(record.transaction_id.clone(), line);

        records.push(record);
    }

    Ok(IngestReport { records, skipped })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "transaction_id,customer_id,timestamp,amount,location,merchant_category";

    fn load(csv_text: &str) -> Result<IngestReport> {
        load_records_from_reader(csv_text.as_bytes())
    }

    #[test]
    fn test_loads_well_formed_rows() {
        let report = load(&format!(
            "{HEADER}\n\
             T1,C1,2024-03-15T10:00:00,500.00,NYC,groceries\n\
             T2,C2,2024-03-15 11:30:00,42.50,Boston,dining\n"
        ))
        .unwrap();

        assert_eq!(report.records.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.records[0].transaction_id, "T1");
        assert_eq!(report.records[0].amount, 500.00);
        assert_eq!(report.records[1].location, "Boston");
    }

    #[test]
    fn test_bad_rows_are_skipped_and_reported() {
        let report = load(&format!(
            "{HEADER}\n\
             T1,C1,2024-03-15T10:00:00,500.00,NYC,groceries\n\
             T2,C1,not-a-time,10.00,NYC,groceries\n\
             T3,C1,2024-03-15T11:00:00,abc,NYC,groceries\n\
             T4,C1,2024-03-15T12:00:00,25.00,NYC,groceries\n"
        ))
        .unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].line, 3);
        assert!(report.skipped[0].message.contains("timestamp"));
        assert_eq!(report.skipped[1].line, 4);
        assert!(report.skipped[1].message.contains("amount"));
    }

    #[test]
    fn test_negative_amount_is_a_row_error() {
        let report = load(&format!(
            "{HEADER}\n\
             T1,C1,2024-03-15T10:00:00,-5.00,NYC,groceries\n"
        ))
        .unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].message.contains("non-negative"));
    }

    #[test]
    fn test_missing_field_is_a_row_error() {
        let report = load(&format!(
            "{HEADER}\n\
             T1,,2024-03-15T10:00:00,5.00,NYC,groceries\n"
        ))
        .unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].message.contains("customer_id"));
    }

    #[test]
    fn test_duplicate_transaction_id_aborts() {
        let result = load(&format!(
            "{HEADER}\n\
             T1,C1,2024-03-15T10:00:00,500.00,NYC,groceries\n\
             T1,C2,2024-03-15T11:00:00,9.99,Boston,dining\n"
        ));

        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate transaction_id 'T1'"));
        assert!(err.contains("lines 2 and 3"));
    }

    #[test]
    fn test_missing_mandatory_column_aborts() {
        let result = load(
            "transaction_id,customer_id,timestamp,amount,location\n\
             T1,C1,2024-03-15T10:00:00,500.00,NYC\n",
        );

        let err = result.unwrap_err().to_string();
        assert!(err.contains("merchant_category"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let report = load(
            "transaction_id,customer_id,timestamp,amount,location,merchant_category,channel\n\
             T1,C1,2024-03-15T10:00:00,500.00,NYC,groceries,online\n",
        )
        .unwrap();

        assert_eq!(report.records.len(), 1);
        assert!(report.skipped.is_empty());
    }
}
