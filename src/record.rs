// Core data model: transaction records, flag reasons, flagged results

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

/// One accepted input row. Immutable after ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Opaque identifier, unique within a batch (enforced at ingestion)
    pub transaction_id: String,

    /// Account holder id; repeats across records
    pub customer_id: String,

    /// Naive wall-clock time; no timezone correction is applied
    pub timestamp: NaiveDateTime,

    /// Non-negative amount in the input currency unit
    pub amount: f64,

    /// Free-text location, compared only for equality
    pub location: String,

    /// Carried through to output context; unused by the current rules
    pub merchant_category: String,
}

/// Timestamp formats accepted on input. First match wins.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601-like timestamp string.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    Err(anyhow!("unparseable timestamp '{}'", raw))
}

// ============================================================================
// FLAG REASON
// ============================================================================

/// Why a transaction was flagged. Serializes as its human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagReason {
    #[serde(rename = "High amount")]
    HighAmount,

    #[serde(rename = "Rapid location change")]
    RapidLocationChange,

    #[serde(rename = "High frequency")]
    HighFrequency,
}

impl FlagReason {
    /// Every reason, in rule-evaluation order
    pub const ALL: [FlagReason; 3] = [
        FlagReason::HighAmount,
        FlagReason::RapidLocationChange,
        FlagReason::HighFrequency,
    ];

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            FlagReason::HighAmount => "High amount",
            FlagReason::RapidLocationChange => "Rapid location change",
            FlagReason::HighFrequency => "High frequency",
        }
    }
}

// ============================================================================
// FLAGGED RESULT
// ============================================================================

/// Output entity: one per flagged transaction, never mutated after creation.
/// Field order here is the field order in the emitted JSON objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlaggedResult {
    pub transaction_id: String,
    pub customer_id: String,

    /// Reason labels in rule-evaluation order, deduplicated
    pub reason: Vec<FlagReason>,

    pub amount: f64,
    pub location: String,

    /// Serialized as an ISO-8601 string by chrono's serde support
    pub timestamp: NaiveDateTime,
}

impl FlaggedResult {
    /// Build a result from the record it flags, carrying fields through.
    pub fn from_record(record: &TransactionRecord, reason: Vec<FlagReason>) -> Self {
        FlaggedResult {
            transaction_id: record.transaction_id.clone(),
            customer_id: record.customer_id.clone(),
            reason,
            amount: record.amount,
            location: record.location.clone(),
            timestamp: record.timestamp,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
