/// Gap recovery orchestration
///
/// Streams the full record set once, works out which sequences never arrived,
/// then asks for each of them on its own connection, one at a time in ascending
/// order. A failed resend is logged and left missing; it never aborts the run.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::collected::CollectedSet;
use crate::error::{ClientError, SessionError};
use crate::gap_detector::GapDetector;
use crate::protocol::TradeRecord;
use crate::session::PacketSource;
use crate::stats::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    StreamingAll,
    GapAnalysis,
    Recovering { index: usize, total: usize },
    Finalizing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every sequence from 1 to the highest seen is present
    Complete,
    /// Output written but some sequences could not be recovered
    Partial,
}

/// Result of a full run
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<TradeRecord>,
    pub complete: bool,
    pub missing_after_stream: Vec<i32>,
    pub recovered: Vec<i32>,
    pub unrecovered: Vec<i32>,
    pub stream_interrupted: Option<SessionError>,
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        if self.complete {
            RunOutcome::Complete
        } else {
            RunOutcome::Partial
        }
    }
}

pub struct RecoveryOrchestrator<S> {
    source: S,
    phase: Phase,
    collected: CollectedSet,
    detector: GapDetector,
    stats: RunStats,
}

impl<S: PacketSource> RecoveryOrchestrator<S> {
    pub fn new(source: S) -> Self {
        RecoveryOrchestrator {
            source,
            phase: Phase::Idle,
            collected: CollectedSet::new(),
            detector: GapDetector::new(),
            stats: RunStats::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drive the whole run: stream, gap analysis, recovery, finalize.
    /// Fails only if the initial stream connection cannot be made.
    pub async fn run(&mut self) -> Result<RunReport, ClientError> {
        self.stats.start();

        self.phase = Phase::StreamingAll;
        info!("requesting full stream");
        let stream = self
            .source
            .stream_all()
            .await
            .map_err(ClientError::InitialStream)?;

        let mut duplicates = 0u64;
        let received = stream.records.len();
        for record in stream.records {
            self.detector.record_observed(record.sequence);
            if self.collected.insert(record) {
                duplicates += 1;
            }
        }
        if self.collected.is_empty() {
            warn!("stream produced no records");
        }
        if duplicates > 0 {
            warn!(duplicates, "duplicate sequences in initial stream");
        }
        self.stats.record_stream(received, stream.bytes_read, duplicates);

        self.phase = Phase::GapAnalysis;
        let max_seq = self.detector.max_observed().unwrap_or(0);
        let missing = self.detector.missing_up_to(max_seq);
        let ranges = self.detector.gap_ranges(max_seq);
        self.stats.record_gaps(missing.len(), ranges.len());
        info!(
            received = self.collected.len(),
            max_seq,
            missing = missing.len(),
            "stream complete"
        );
        if !missing.is_empty() {
            info!(gaps = ?ranges, "requesting missing sequences");
        }

        let (recovered, unrecovered) = self.recover_all(&missing).await;

        self.phase = Phase::Finalizing;
        let collected = std::mem::take(&mut self.collected);
        let finalized = collected.finalize();
        if finalized.complete {
            info!(records = finalized.records.len(), "all sequences received");
        } else {
            warn!(
                records = finalized.records.len(),
                unrecovered = ?unrecovered,
                "output is missing sequences"
            );
        }

        self.phase = Phase::Done;
        Ok(RunReport {
            records: finalized.records,
            complete: finalized.complete,
            missing_after_stream: missing,
            recovered,
            unrecovered,
            stream_interrupted: stream.interrupted,
        })
    }

    async fn recover_all(&mut self, missing: &[i32]) -> (Vec<i32>, Vec<i32>) {
        let total = missing.len();
        let mut queue: VecDeque<i32> = missing.iter().copied().collect();
        let mut recovered = Vec::new();
        let mut unrecovered = Vec::new();
        let mut index = 0;

        while let Some(sequence) = queue.pop_front() {
            self.phase = Phase::Recovering { index, total };
            index += 1;

            let started = Instant::now();
            let ok = self.recover_sequence(sequence).await;
            self.stats.record_recovery(ok, started.elapsed());

            if ok {
                recovered.push(sequence);
            } else {
                unrecovered.push(sequence);
            }
        }

        (recovered, unrecovered)
    }

    /// One resend round trip. True when `sequence` is held afterwards.
    async fn recover_sequence(&mut self, sequence: i32) -> bool {
        match self.source.recover_one(sequence).await {
            Ok(Some(record)) => {
                let got = record.sequence;
                if got != sequence {
                    warn!(requested = sequence, received = got, "resend returned a different sequence");
                }
                self.detector.record_observed(got);
                if self.collected.insert_if_absent(record) {
                    info!(sequence = got, "recovered missing record");
                } else {
                    debug!(sequence = got, "resend returned an already held record");
                }
                self.collected.contains(sequence)
            }
            Ok(None) => {
                warn!(sequence, "server closed without sending the record");
                false
            }
            Err(err) => {
                warn!(sequence, error = %err, "could not recover record");
                false
            }
        }
    }
}
