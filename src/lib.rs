// Fraud Sentinel - Core Library
// Exposes all modules for use in the CLI and tests

pub mod detector;
pub mod history;
pub mod ingest;
pub mod record;
pub mod report;
pub mod rules;

// Re-export commonly used types
pub use detector::Detector;
pub use history::CustomerIndex;
pub use ingest::{load_records, load_records_from_reader, IngestReport, SkippedRow};
pub use record::{parse_timestamp, FlagReason, FlaggedResult, TransactionRecord};
pub use report::{to_json, write_report, RunSummary};
pub use rules::{
    default_rules, DetectionConfig, DetectionRule, HighAmountRule, HighFrequencyRule,
    RapidLocationChangeRule,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
