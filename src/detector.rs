// Detection engine: runs the rule list over a batch and aggregates the
// triggered reasons into ordered flagged results.

use std::collections::HashMap;

use crate::history::CustomerIndex;
use crate::record::{FlagReason, FlaggedResult, TransactionRecord};
use crate::rules::{default_rules, DetectionConfig, DetectionRule};

// ============================================================================
// DETECTOR
// ============================================================================

/// Batch detector. Pure over its input: no state survives a call, so the
/// same batch always produces the same output and separate batches can be
/// processed independently.
pub struct Detector {
    config: DetectionConfig,
    rules: Vec<Box<dyn DetectionRule>>,
}

impl Detector {
    /// Detector with the standard rule list
    pub fn new(config: DetectionConfig) -> Self {
        Detector {
            config,
            rules: default_rules(),
        }
    }

    /// Detector with a caller-supplied rule list (evaluation order = list order)
    pub fn with_rules(config: DetectionConfig, rules: Vec<Box<dyn DetectionRule>>) -> Self {
        Detector { config, rules }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Rule Evaluator: map each flagged transaction_id to its reasons, in
    /// rule-evaluation order with duplicates dropped. Transactions that
    /// trigger nothing do not appear in the map.
    pub fn evaluate(&self, records: &[TransactionRecord]) -> HashMap<String, Vec<FlagReason>> {
        let index = CustomerIndex::build(records);
        let mut reason_map: HashMap<String, Vec<FlagReason>> = HashMap::new();

        for (_, history) in index.iter() {
            for position in 0..history.len() {
                let record = &records[history[position]];

                let mut reasons = Vec::new();
                for rule in &self.rules {
                    if !rule.is_enabled(&self.config) {
                        continue;
                    }
                    if let Some(reason) = rule.evaluate(records, history, position, &self.config) {
                        if !reasons.contains(&reason) {
                            reasons.push(reason);
                        }
                    }
                }

                if !reasons.is_empty() {
                    reason_map.insert(record.transaction_id.clone(), reasons);
                }
            }
        }

        reason_map
    }

    /// Aggregator: keep only transactions with at least one reason, ordered
    /// by ascending timestamp with input order as the stable tie-break.
    pub fn aggregate(
        &self,
        records: &[TransactionRecord],
        reason_map: &HashMap<String, Vec<FlagReason>>,
    ) -> Vec<FlaggedResult> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&i| records[i].timestamp);

        order
            .into_iter()
            .filter_map(|i| {
                let record = &records[i];
                reason_map
                    .get(&record.transaction_id)
                    .map(|reasons| FlaggedResult::from_record(record, reasons.clone()))
            })
            .collect()
    }

    /// Full pass: evaluate every rule, then aggregate.
    pub fn detect(&self, records: &[TransactionRecord]) -> Vec<FlaggedResult> {
        let reason_map = self.evaluate(records);
        self.aggregate(records, &reason_map)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;

    fn record(
        id: &str,
        customer: &str,
        ts: &str,
        amount: f64,
        location: &str,
    ) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            customer_id: customer.to_string(),
            timestamp: parse_timestamp(ts).unwrap(),
            amount,
            location: location.to_string(),
            merchant_category: "misc".to_string(),
        }
    }

    fn detect(records: &[TransactionRecord]) -> Vec<FlaggedResult> {
        Detector::new(DetectionConfig::default()).detect(records)
    }

    #[test]
    fn test_single_modest_record_produces_nothing() {
        // Scenario: one record, amount 500, one location
        let records = vec![record("T1", "C1", "2024-03-15T10:00:00", 500.0, "NYC")];
        assert!(detect(&records).is_empty());
    }

    #[test]
    fn test_single_large_record_flags_high_amount() {
        // Scenario: one record, amount 6000
        let records = vec![record("T1", "C1", "2024-03-15T10:00:00", 6000.0, "NYC")];

        let results = detect(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction_id, "T1");
        assert_eq!(results[0].reason, vec![FlagReason::HighAmount]);
    }

    #[test]
    fn test_two_cities_ten_minutes_apart() {
        // Scenario: NYC then Las Vegas, 10 minutes apart
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 50.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:10:00", 50.0, "Las Vegas"),
        ];

        let results = detect(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction_id, "T2");
        assert_eq!(results[0].reason, vec![FlagReason::RapidLocationChange]);
    }

    #[test]
    fn test_burst_of_four_flags_only_the_fourth() {
        // Scenario: 4 records inside one 60-minute window, same location
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 10.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:10:00", 10.0, "NYC"),
            record("T3", "C1", "2024-03-15T10:20:00", 10.0, "NYC"),
            record("T4", "C1", "2024-03-15T10:30:00", 10.0, "NYC"),
        ];

        let results = detect(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction_id, "T4");
        assert_eq!(results[0].reason, vec![FlagReason::HighFrequency]);
    }

    #[test]
    fn test_flagged_results_carry_record_fields_through() {
        let records = vec![record("T1", "C9", "2024-03-15T10:00:00", 2500.5, "Chicago")];

        let results = detect(&records);
        assert_eq!(results.len(), 1);
        let flagged = &results[0];
        assert_eq!(flagged.transaction_id, records[0].transaction_id);
        assert_eq!(flagged.customer_id, records[0].customer_id);
        assert_eq!(flagged.amount, records[0].amount);
        assert_eq!(flagged.location, records[0].location);
        assert_eq!(flagged.timestamp, records[0].timestamp);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 5000.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:05:00", 20.0, "Boston"),
            record("T3", "C2", "2024-03-15T11:00:00", 700.0, "Miami"),
        ];

        let detector = Detector::new(DetectionConfig::default());
        let first = detector.detect(&records);
        let second = detector.detect(&records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrelated_record_does_not_disturb_existing_flags() {
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 5000.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:05:00", 20.0, "Boston"),
        ];
        let baseline = detect(&records);

        // Far in time, low amount, brand new customer
        let mut extended = records.clone();
        extended.push(record("T9", "C9", "2029-01-01T00:00:00", 1.0, "Anchorage"));

        let with_extra = detect(&extended);
        assert_eq!(baseline, with_extra);
    }

    #[test]
    fn test_one_record_can_carry_every_reason_in_rule_order() {
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 10.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:10:00", 10.0, "NYC"),
            record("T3", "C1", "2024-03-15T10:20:00", 10.0, "NYC"),
            record("T4", "C1", "2024-03-15T10:30:00", 5000.0, "Las Vegas"),
        ];

        let results = detect(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction_id, "T4");
        assert_eq!(
            results[0].reason,
            vec![
                FlagReason::HighAmount,
                FlagReason::RapidLocationChange,
                FlagReason::HighFrequency,
            ]
        );
    }

    #[test]
    fn test_output_ordered_by_timestamp_then_input_order() {
        // Input deliberately out of time order, with a timestamp tie
        let records = vec![
            record("T1", "C1", "2024-03-15T12:00:00", 3000.0, "NYC"),
            record("T2", "C2", "2024-03-15T09:00:00", 4000.0, "Boston"),
            record("T3", "C3", "2024-03-15T12:00:00", 5000.0, "Miami"),
        ];

        let results = detect(&records);
        let ids: Vec<&str> = results.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1", "T3"]);
    }

    #[test]
    fn test_disabling_a_rule_suppresses_its_flags() {
        let records = vec![record("T1", "C1", "2024-03-15T10:00:00", 6000.0, "NYC")];

        let config = DetectionConfig {
            high_amount_enabled: false,
            ..DetectionConfig::default()
        };
        let results = Detector::new(config).detect(&records);
        assert!(results.is_empty());
    }

    #[test]
    fn test_threshold_overrides_take_effect() {
        let records = vec![record("T1", "C1", "2024-03-15T10:00:00", 150.0, "NYC")];

        let config = DetectionConfig {
            high_amount_threshold: 100.0,
            ..DetectionConfig::default()
        };
        let results = Detector::new(config).detect(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reason, vec![FlagReason::HighAmount]);
    }

    #[test]
    fn test_evaluate_maps_ids_to_reasons() {
        let records = vec![
            record("T1", "C1", "2024-03-15T10:00:00", 6000.0, "NYC"),
            record("T2", "C1", "2024-03-15T10:30:00", 5.0, "NYC"),
        ];

        let detector = Detector::new(DetectionConfig::default());
        let reason_map = detector.evaluate(&records);

        assert_eq!(reason_map.len(), 1);
        assert_eq!(reason_map["T1"], vec![FlagReason::HighAmount]);
        assert!(!reason_map.contains_key("T2"));
    }
}
