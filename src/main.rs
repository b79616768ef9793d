use anyhow::Result;
use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;

use fraud_sentinel::{load_records, write_report, DetectionConfig, Detector, RunSummary};

/// Command line arguments holder.
#[derive(Parser)]
#[command(author, version, about = "Flags suspicious transactions in a CSV batch", long_about = None)]
struct Args {
    /// CSV file of transaction records
    #[arg(short, long)]
    input: PathBuf,

    /// Destination JSON file for flagged transactions
    #[arg(short, long)]
    output: PathBuf,

    /// Amounts strictly above this are flagged
    #[arg(long, default_value_t = 1000.0)]
    high_amount_threshold: f64,

    /// Minutes within which a location change counts as rapid
    #[arg(long, default_value_t = 60)]
    location_window_mins: i64,

    /// Trailing window in minutes for the frequency count
    #[arg(long, default_value_t = 60)]
    frequency_window_mins: i64,

    /// Trailing count that must be exceeded to flag high frequency
    #[arg(long, default_value_t = 3)]
    frequency_count: usize,

    /// Disable the high-amount rule
    #[arg(long)]
    no_high_amount: bool,

    /// Disable the rapid-location-change rule
    #[arg(long)]
    no_location_change: bool,

    /// Disable the high-frequency rule
    #[arg(long)]
    no_high_frequency: bool,
}

impl Args {
    fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            high_amount_threshold: self.high_amount_threshold,
            high_amount_enabled: !self.no_high_amount,
            location_change_window: Duration::minutes(self.location_window_mins),
            location_change_enabled: !self.no_location_change,
            frequency_window: Duration::minutes(self.frequency_window_mins),
            frequency_count_threshold: self.frequency_count,
            frequency_enabled: !self.no_high_frequency,
        }
    }
}

/// Effectively main(), separated so it can return early with `?` and leave
/// process exit handling to the caller.
fn run(args: Args) -> Result<()> {
    println!("📂 Loading {:?}...", args.input);
    let ingest = load_records(&args.input)?;

    for row in &ingest.skipped {
        eprintln!("⚠️  Skipped line {}: {}", row.line, row.message);
    }
    println!("✓ Loaded {} transactions", ingest.records.len());

    let detector = Detector::new(args.detection_config());
    let flagged = detector.detect(&ingest.records);

    write_report(&args.output, &flagged)?;
    println!("✓ Wrote {:?}", args.output);

    RunSummary::compute(&ingest, &flagged).print();

    Ok(())
}

fn main() -> Result<()> {
    run(Args::parse())
}
