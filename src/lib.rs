/// Trade Feed Client - snapshot and gap recovery for a sequenced trade feed
///
/// Requests the full record stream from an exchange over TCP, decodes the
/// fixed-width 17-byte records, finds sequence gaps, and asks for each missing
/// record on its own connection. Features include:
/// - Fixed-width big-endian record codec
/// - Chunk-boundary independent stream decoding
/// - Sequence gap detection
/// - Strictly sequential single-record recovery
/// - Run statistics and JSON output

pub mod protocol;
pub mod decoder;
pub mod gap_detector;
pub mod collected;
pub mod error;
pub mod session;
pub mod recovery;
pub mod stats;
pub mod config;
pub mod output;

pub use protocol::{decode_record, encode_record, CallType, RequestFrame, Side, TradeRecord, RECORD_SIZE};
pub use decoder::{DecodeError, StreamDecoder};
pub use gap_detector::GapDetector;
pub use collected::{CollectedSet, FinalizedRecords};
pub use error::{ClientError, SessionError};
pub use session::{PacketSource, StreamAll, TcpSession};
pub use recovery::{Phase, RecoveryOrchestrator, RunOutcome, RunReport};
pub use stats::{LatencyStats, RunStats};
pub use config::ClientConfig;
