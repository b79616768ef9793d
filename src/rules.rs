// Detection rules - each rule is an independent object behind a uniform
// contract so new rules slot in without touching existing ones.

use chrono::Duration;

use crate::record::{FlagReason, TransactionRecord};

// ============================================================================
// DETECTION CONFIG
// ============================================================================

/// Thresholds, windows and per-rule toggles. Every rule reads its
/// parameters from here; nothing is hard-coded in the rules themselves.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Amounts strictly above this are flagged (default: 1000.0)
    pub high_amount_threshold: f64,
    pub high_amount_enabled: bool,

    /// Maximum gap between two differing-location records for the later
    /// one to be flagged; the gap must be strictly smaller (default: 60 min)
    pub location_change_window: Duration,
    pub location_change_enabled: bool,

    /// Trailing window for the frequency count, inclusive of the record
    /// itself (default: 60 min)
    pub frequency_window: Duration,
    /// Flag when the trailing count strictly exceeds this (default: 3)
    pub frequency_count_threshold: usize,
    pub frequency_enabled: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            high_amount_threshold: 1000.0,
            high_amount_enabled: true,
            location_change_window: Duration::minutes(60),
            location_change_enabled: true,
            frequency_window: Duration::minutes(60),
            frequency_count_threshold: 3,
            frequency_enabled: true,
        }
    }
}

// ============================================================================
// RULE CONTRACT
// ============================================================================

/// One detection rule.
///
/// `history` holds the indices of the customer's records in the batch,
/// sorted by timestamp (input order breaks ties), and `position` is where
/// the record under evaluation sits in that history. Rules never mutate
/// anything and never fail: a rule either produces its reason or nothing.
pub trait DetectionRule {
    /// The reason this rule attaches when it fires
    fn reason(&self) -> FlagReason;

    fn is_enabled(&self, config: &DetectionConfig) -> bool;

    fn evaluate(
        &self,
        records: &[TransactionRecord],
        history: &[usize],
        position: usize,
        config: &DetectionConfig,
    ) -> Option<FlagReason>;
}

/// The fixed rule list, in evaluation order. Reason lists on flagged
/// results preserve this order.
pub fn default_rules() -> Vec<Box<dyn DetectionRule>> {
    vec![
        Box::new(HighAmountRule),
        Box::new(RapidLocationChangeRule),
        Box::new(HighFrequencyRule),
    ]
}

// ============================================================================
// RULE 1: HIGH AMOUNT
// ============================================================================

/// Flags any record whose amount strictly exceeds the threshold.
/// Pure per-record check; ignores history.
pub struct HighAmountRule;

impl DetectionRule for HighAmountRule {
    fn reason(&self) -> FlagReason {
        FlagReason::HighAmount
    }

    fn is_enabled(&self, config: &DetectionConfig) -> bool {
        config.high_amount_enabled
    }

    fn evaluate(
        &self,
        records: &[TransactionRecord],
        history: &[usize],
        position: usize,
        config: &DetectionConfig,
    ) -> Option<FlagReason> {
        let record = &records[history[position]];
        if record.amount > config.high_amount_threshold {
            Some(self.reason())
        } else {
            None
        }
    }
}

// ============================================================================
// RULE 2: RAPID LOCATION CHANGE
// ============================================================================

/// Flags a record whose immediately preceding record (nearest neighbor in
/// the customer's sorted history, not every record in the window) has a
/// different location less than the configured window earlier. Comparing
/// only against the nearest prior record avoids double-flagging a long
/// stay followed by one trip.
pub struct RapidLocationChangeRule;

impl DetectionRule for RapidLocationChangeRule {
    fn reason(&self) -> FlagReason {
        FlagReason::RapidLocationChange
    }

    fn is_enabled(&self, config: &DetectionConfig) -> bool {
        config.location_change_enabled
    }

    fn evaluate(
        &self,
        records: &[TransactionRecord],
        history: &[usize],
        position: usize,
        config: &DetectionConfig,
    ) -> Option<FlagReason> {
        if position == 0 {
            return None; // first record of this customer, nothing to compare
        }

        let current = &records[history[position]];
        let previous = &records[history[position - 1]];

        let gap = current.timestamp - previous.timestamp;
        if current.location != previous.location && gap < config.location_change_window {
            Some(self.reason())
        } else {
            None
        }
    }
}

// ============================================================================
// RULE 3: HIGH FREQUENCY
// ============================================================================

/// Flags a record when the customer's trailing transaction count exceeds
/// the threshold. The window is anchored at the record's own timestamp,
/// extends backward, and includes the record itself; only records at or
/// before it in the sorted history are counted.
pub struct HighFrequencyRule;

impl DetectionRule for HighFrequencyRule {
    fn reason(&self) -> FlagReason {
        FlagReason::HighFrequency
    }

    fn is_enabled(&self, config: &DetectionConfig) -> bool {
        config.frequency_enabled
    }

    fn evaluate(
        &self,
        records: &[TransactionRecord],
        history: &[usize],
        position: usize,
        config: &DetectionConfig,
    ) -> Option<FlagReason> {
        let anchor = records[history[position]].timestamp;
        let window_start = anchor - config.frequency_window;

        // History is timestamp-sorted, so the in-window prefix boundary can
        // be found by binary search. Window is inclusive at both ends.
        let prefix = &history[..=position];
        let first_inside = prefix.partition_point(|&i| records[i].timestamp < window_start);
        let count = prefix.len() - first_inside;

        if count > config.frequency_count_threshold {
            Some(self.reason())
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
