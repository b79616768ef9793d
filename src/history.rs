// Per-customer history index shared by the history-dependent rules

use std::collections::HashMap;

use crate::record::TransactionRecord;

/// Maps each customer to the indices of their records in the batch,
/// sorted by timestamp. The sort is stable, so records with identical
/// timestamps keep their original input order.
///
/// Built once per run and read-only afterwards, so every rule sees the
/// same view of each customer's history.
#[derive(Debug)]
pub struct CustomerIndex {
    histories: HashMap<String, Vec<usize>>,
}

impl CustomerIndex {
    pub fn build(records: &[TransactionRecord]) -> Self {
        let mut histories: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            histories
                .entry(record.customer_id.clone())
                .or_default()
                .push(index);
        }

        for indices in histories.values_mut() {
            // Indices were pushed in input order; stable sort keeps that
            // order as the tie-break for equal timestamps.
            indices.sort_by_key(|&i| records[i].timestamp);
        }

        CustomerIndex { histories }
    }

    /// Timestamp-sorted record indices for one customer. Empty slice for
    /// customers not present in the batch.
    pub fn history(&self, customer_id: &str) -> &[usize] {
        self.histories
            .get(customer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position of `record_index` within its customer's sorted history.
    pub fn position(&self, customer_id: &str, record_index: usize) -> Option<usize> {
        self.history(customer_id)
            .iter()
            .position(|&i| i == record_index)
    }

    /// Iterate over every customer's sorted history. Customer order is
    /// unspecified; callers must not depend on it.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.histories
            .iter()
            .map(|(customer, indices)| (customer.as_str(), indices.as_slice()))
    }

    pub fn customer_count(&self) -> usize {
        self.histories.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
