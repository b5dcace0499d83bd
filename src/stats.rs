/// Run statistics tracking
///
/// Tracks records and bytes per phase, duplicates, gaps and recovery round-trip latency.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::info;

const WINDOW_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

#[derive(Debug, Clone)]
pub struct RunStats {
    start_time: Option<Instant>,

    // Initial stream
    stream_records: u64,
    stream_bytes: u64,
    stream_duplicates: u64,

    // Gap analysis
    gaps_detected: u64,
    gap_ranges: u64,

    // Recovery
    recovery_attempts: u64,
    recovered: u64,
    recovery_failures: u64,
    recovery_latencies: VecDeque<u64>,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            start_time: None,
            stream_records: 0,
            stream_bytes: 0,
            stream_duplicates: 0,
            gaps_detected: 0,
            gap_ranges: 0,
            recovery_attempts: 0,
            recovered: 0,
            recovery_failures: 0,
            recovery_latencies: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    /// Record the outcome of the stream-all phase
    pub fn record_stream(&mut self, records: usize, bytes: u64, duplicates: u64) {
        self.stream_records += records as u64;
        self.stream_bytes += bytes;
        self.stream_duplicates += duplicates;
    }

    /// Record gap analysis result
    pub fn record_gaps(&mut self, missing: usize, ranges: usize) {
        self.gaps_detected += missing as u64;
        self.gap_ranges += ranges as u64;
    }

    /// Record one recovery run and its round-trip time
    pub fn record_recovery(&mut self, success: bool, elapsed: Duration) {
        self.recovery_attempts += 1;
        if success {
            self.recovered += 1;
        } else {
            self.recovery_failures += 1;
        }

        if self.recovery_latencies.len() >= WINDOW_SIZE {
            self.recovery_latencies.pop_front();
        }
        self.recovery_latencies
            .push_back(elapsed.as_micros().min(u128::from(u64::MAX)) as u64);
    }

    /// Recovery round-trip latency statistics
    pub fn recovery_latency_stats(&self) -> Option<LatencyStats> {
        if self.recovery_latencies.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.recovery_latencies.iter().copied().collect();
        sorted.sort_unstable();

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let mean = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        let p50 = sorted[sorted.len() / 2];
        let p99 = sorted[(sorted.len() * 99) / 100];

        Some(LatencyStats {
            min_us: min,
            max_us: max,
            mean_us: mean,
            p50_us: p50,
            p99_us: p99,
        })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| st.elapsed())
    }

    pub fn stream_records(&self) -> u64 {
        self.stream_records
    }

    pub fn stream_bytes(&self) -> u64 {
        self.stream_bytes
    }

    pub fn stream_duplicates(&self) -> u64 {
        self.stream_duplicates
    }

    pub fn gaps_detected(&self) -> u64 {
        self.gaps_detected
    }

    pub fn gap_ranges(&self) -> u64 {
        self.gap_ranges
    }

    pub fn recovery_attempts(&self) -> u64 {
        self.recovery_attempts
    }

    pub fn recovered(&self) -> u64 {
        self.recovered
    }

    pub fn recovery_failures(&self) -> u64 {
        self.recovery_failures
    }

    pub fn reset(&mut self) {
        *self = RunStats::new();
    }

    /// Log a summary of the run
    pub fn log_summary(&self) {
        info!(
            records = self.stream_records,
            bytes = self.stream_bytes,
            duplicates = self.stream_duplicates,
            elapsed = ?self.elapsed(),
            "stream summary"
        );
        info!(
            missing = self.gaps_detected,
            ranges = self.gap_ranges,
            attempts = self.recovery_attempts,
            recovered = self.recovered,
            failed = self.recovery_failures,
            "recovery summary"
        );

        if let Some(stats) = self.recovery_latency_stats() {
            info!(
                min_us = stats.min_us,
                max_us = stats.max_us,
                mean_us = stats.mean_us,
                p50_us = stats.p50_us,
                p99_us = stats.p99_us,
                "recovery latency"
            );
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
