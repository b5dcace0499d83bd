/// Recovery orchestration tests against a scripted packet source

use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use trade_feed_client::error::SessionResult;
use trade_feed_client::{
    ClientError, PacketSource, Phase, RecoveryOrchestrator, RunOutcome, SessionError, Side,
    StreamAll, TradeRecord,
};

fn record(sequence: i32) -> TradeRecord {
    TradeRecord {
        symbol: "MSFT".to_string(),
        side: if sequence % 2 == 0 { Side::Sell } else { Side::Buy },
        quantity: sequence * 5,
        price: 300 + sequence,
        sequence,
    }
}

#[derive(Clone, Copy)]
enum Resend {
    Deliver,
    Refuse,
    Close,
    Wrong(i32),
}

struct MockExchange {
    stream: Vec<i32>,
    interrupted: bool,
    resends: HashMap<i32, Resend>,
    requested: Vec<i32>,
}

impl MockExchange {
    fn new(stream: &[i32]) -> Self {
        MockExchange {
            stream: stream.to_vec(),
            interrupted: false,
            resends: HashMap::new(),
            requested: Vec::new(),
        }
    }

    fn with_resend(mut self, sequence: i32, behaviour: Resend) -> Self {
        self.resends.insert(sequence, behaviour);
        self
    }
}

#[async_trait]
impl PacketSource for MockExchange {
    async fn stream_all(&mut self) -> SessionResult<StreamAll> {
        let interrupted = self.interrupted.then(|| {
            SessionError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        });
        Ok(StreamAll {
            records: self.stream.iter().map(|&s| record(s)).collect(),
            bytes_read: (self.stream.len() * 17) as u64,
            interrupted,
        })
    }

    async fn recover_one(&mut self, sequence: i32) -> SessionResult<Option<TradeRecord>> {
        self.requested.push(sequence);
        match self.resends.get(&sequence).copied().unwrap_or(Resend::Deliver) {
            Resend::Deliver => Ok(Some(record(sequence))),
            Resend::Refuse => Err(SessionError::Connect {
                addr: "localhost:3000".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            }),
            Resend::Close => Ok(None),
            Resend::Wrong(other) => Ok(Some(record(other))),
        }
    }
}

fn sequences(records: &[TradeRecord]) -> Vec<i32> {
    records.iter().map(|r| r.sequence).collect()
}

#[tokio::test]
async fn test_single_gap_recovered() {
    let mut orchestrator = RecoveryOrchestrator::new(MockExchange::new(&[1, 2, 4, 5]));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(orchestrator.source().requested, vec![3]);
    assert_eq!(report.missing_after_stream, vec![3]);
    assert_eq!(report.recovered, vec![3]);
    assert_eq!(sequences(&report.records), vec![1, 2, 3, 4, 5]);
    assert!(report.complete);
    assert_eq!(report.outcome(), RunOutcome::Complete);
    assert_eq!(orchestrator.phase(), Phase::Done);
}

#[tokio::test]
async fn test_failed_recovery_leaves_gap() {
    let source = MockExchange::new(&[1, 3]).with_resend(2, Resend::Refuse);
    let mut orchestrator = RecoveryOrchestrator::new(source);
    let report = orchestrator.run().await.unwrap();

    assert_eq!(orchestrator.source().requested, vec![2]);
    assert_eq!(sequences(&report.records), vec![1, 3]);
    assert_eq!(report.unrecovered, vec![2]);
    assert!(!report.complete);
    assert_eq!(report.outcome(), RunOutcome::Partial);
    assert_eq!(orchestrator.stats().recovery_failures(), 1);
}

#[tokio::test]
async fn test_recovery_in_ascending_order_continues_past_failures() {
    let source = MockExchange::new(&[9, 1, 5])
        .with_resend(3, Resend::Close)
        .with_resend(6, Resend::Refuse);
    let mut orchestrator = RecoveryOrchestrator::new(source);
    let report = orchestrator.run().await.unwrap();

    assert_eq!(orchestrator.source().requested, vec![2, 3, 4, 6, 7, 8]);
    assert_eq!(report.recovered, vec![2, 4, 7, 8]);
    assert_eq!(report.unrecovered, vec![3, 6]);
    assert_eq!(sequences(&report.records), vec![1, 2, 4, 5, 7, 8, 9]);
    assert!(!report.complete);
    assert_eq!(orchestrator.stats().recovery_attempts(), 6);
}

#[tokio::test]
async fn test_wrong_sequence_in_resend() {
    let source = MockExchange::new(&[1, 2, 4]).with_resend(3, Resend::Wrong(2));
    let mut orchestrator = RecoveryOrchestrator::new(source);
    let report = orchestrator.run().await.unwrap();

    assert_eq!(sequences(&report.records), vec![1, 2, 4]);
    assert_eq!(report.unrecovered, vec![3]);
    assert!(!report.complete);
}

#[tokio::test]
async fn test_resend_of_unknown_sequence_is_kept() {
    let source = MockExchange::new(&[1, 3]).with_resend(2, Resend::Wrong(7));
    let mut orchestrator = RecoveryOrchestrator::new(source);
    let report = orchestrator.run().await.unwrap();

    assert_eq!(sequences(&report.records), vec![1, 3, 7]);
    assert_eq!(report.unrecovered, vec![2]);
}

#[tokio::test]
async fn test_interrupted_stream_still_recovers() {
    let mut source = MockExchange::new(&[1, 2, 4]);
    source.interrupted = true;
    let mut orchestrator = RecoveryOrchestrator::new(source);
    let report = orchestrator.run().await.unwrap();

    assert!(report.stream_interrupted.is_some());
    assert_eq!(sequences(&report.records), vec![1, 2, 3, 4]);
    assert!(report.complete);
}

#[tokio::test]
async fn test_dropped_final_record_is_not_detected() {
    // 1..=5 exist server side but 5 never arrived
    let mut orchestrator = RecoveryOrchestrator::new(MockExchange::new(&[1, 2, 3, 4]));
    let report = orchestrator.run().await.unwrap();

    assert!(orchestrator.source().requested.is_empty());
    assert!(report.complete);
}

struct Unreachable;

#[async_trait]
impl PacketSource for Unreachable {
    async fn stream_all(&mut self) -> SessionResult<StreamAll> {
        Err(SessionError::Connect {
            addr: "localhost:1".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        })
    }

    async fn recover_one(&mut self, _sequence: i32) -> SessionResult<Option<TradeRecord>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_initial_stream_failure() {
    let mut orchestrator = RecoveryOrchestrator::new(Unreachable);
    let result = orchestrator.run().await;
    assert!(matches!(result, Err(ClientError::InitialStream(ref e)) if e.is_connect()));
}
