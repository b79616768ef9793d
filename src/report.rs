// Result emission and run summary

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::ingest::IngestReport;
use crate::record::{FlagReason, FlaggedResult};

// ============================================================================
// JSON EMISSION
// ============================================================================

/// Serialize flagged results to a JSON array (pretty-printed, one object
/// per result). An empty slice serializes to `[]`.
pub fn to_json(results: &[FlaggedResult]) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(results).context("Failed to serialize flagged results")?;
    json.push('\n');
    Ok(json)
}

/// Write the results to `path`. Serialization happens fully in memory and
/// the bytes land in a temporary file that is renamed over the target, so
/// a failed run never leaves a truncated output file behind.
pub fn write_report<P: AsRef<Path>>(path: P, results: &[FlaggedResult]) -> Result<()> {
    let json = to_json(results)?;

    let path = path.as_ref();
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write output file: {:?}", tmp_path))?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("Failed to move output into place: {:?}", path));
    }

    Ok(())
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// Counts for the end-of-run console report.
#[derive(Debug)]
pub struct RunSummary {
    pub accepted_records: usize,
    pub skipped_rows: usize,
    pub flagged: usize,
    /// One entry per reason, in rule-evaluation order
    pub reason_counts: Vec<(FlagReason, usize)>,
}

impl RunSummary {
    pub fn compute(ingest: &IngestReport, results: &[FlaggedResult]) -> Self {
        let reason_counts = FlagReason::ALL
            .iter()
            .map(|&reason| {
                let count = results.iter().filter(|r| r.reason.contains(&reason)).count();
                (reason, count)
            })
            .collect();

        RunSummary {
            accepted_records: ingest.records.len(),
            skipped_rows: ingest.skipped.len(),
            flagged: results.len(),
            reason_counts,
        }
    }

    /// Print the summary in the console style used across the binary.
    pub fn print(&self) {
        println!(
            "✓ Screened {} transactions ({} rows skipped)",
            self.accepted_records, self.skipped_rows
        );
        println!("✓ Flagged {} as suspicious", self.flagged);
        for (reason, count) in &self.reason_counts {
            println!("  - {}: {}", reason.label(), count);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
