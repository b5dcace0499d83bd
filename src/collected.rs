/// Sequence-keyed store of every record obtained during a run.

use std::collections::BTreeMap;

use crate::protocol::TradeRecord;

#[derive(Debug, Clone, Default)]
pub struct CollectedSet {
    records: BTreeMap<i32, TradeRecord>,
}

/// Result of `CollectedSet::finalize`: records ordered by sequence plus the
/// completeness verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedRecords {
    pub records: Vec<TradeRecord>,
    pub complete: bool,
}

impl CollectedSet {
    pub fn new() -> Self {
        CollectedSet {
            records: BTreeMap::new(),
        }
    }

    /// Insert keyed by sequence. A record with an already-present sequence
    /// replaces the earlier one; returns true when it was a duplicate.
    pub fn insert(&mut self, record: TradeRecord) -> bool {
        self.records.insert(record.sequence, record).is_some()
    }

    /// Insert only if the sequence is not already held. Returns true if inserted.
    pub fn insert_if_absent(&mut self, record: TradeRecord) -> bool {
        if self.records.contains_key(&record.sequence) {
            return false;
        }
        self.records.insert(record.sequence, record);
        true
    }

    pub fn contains(&self, sequence: i32) -> bool {
        self.records.contains_key(&sequence)
    }

    pub fn get(&self, sequence: i32) -> Option<&TradeRecord> {
        self.records.get(&sequence)
    }

    pub fn max_sequence(&self) -> Option<i32> {
        self.records.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the set into sequence order and check that the sequences form
    /// the contiguous run `1..=len`.
    pub fn finalize(self) -> FinalizedRecords {
        let records: Vec<TradeRecord> = self.records.into_values().collect();
        let complete = records
            .iter()
            .enumerate()
            .all(|(index, record)| i64::from(record.sequence) == index as i64 + 1);
        FinalizedRecords { records, complete }
    }
}
