/// Sequence number gap detection
///
/// Tracks which sequence numbers have been observed and reports the ones
/// missing from `1..=max`. A record dropped after the highest observed
/// sequence cannot be detected here.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    observed: BTreeSet<i32>,
}

impl GapDetector {
    pub fn new() -> Self {
        GapDetector {
            observed: BTreeSet::new(),
        }
    }

    /// Mark a sequence number as seen. Idempotent.
    pub fn record_observed(&mut self, seq_num: i32) {
        self.observed.insert(seq_num);
    }

    /// Every sequence in `[1, max_seq]` not yet observed, ascending
    pub fn missing_up_to(&self, max_seq: i32) -> Vec<i32> {
        (1..=max_seq)
            .filter(|seq| !self.observed.contains(seq))
            .collect()
    }

    /// Highest sequence observed so far
    pub fn max_observed(&self) -> Option<i32> {
        self.observed.last().copied()
    }

    /// Missing sequences grouped into inclusive (start, end) ranges
    pub fn gap_ranges(&self, max_seq: i32) -> Vec<(i32, i32)> {
        let mut ranges: Vec<(i32, i32)> = Vec::new();
        for seq in self.missing_up_to(max_seq) {
            match ranges.last_mut() {
                Some((_, end)) if *end + 1 == seq => *end = seq,
                _ => ranges.push((seq, seq)),
            }
        }
        ranges
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn reset(&mut self) {
        self.observed.clear();
    }
}
