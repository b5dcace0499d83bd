/// Streaming record decoder
///
/// The wire carries back-to-back fixed-width records with no boundary markers,
/// so the decoder keeps whatever partial tail a read left behind and completes
/// it with the next chunk. One instance per connection.

use crate::protocol::{decode_record, TradeRecord, RECORD_SIZE};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("invalid side indicator: {0:#04x}")]
    InvalidSide(u8),

    #[error("malformed record: {0}")]
    MalformedRecord(&'static str),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    records_decoded: u64,
    bytes_fed: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder {
            buffer: Vec::with_capacity(RECORD_SIZE * 64),
            records_decoded: 0,
            bytes_fed: 0,
        }
    }

    /// Append a chunk and push every complete record now available onto `out`.
    /// Returns how many were pushed; leftover bytes are kept for the next call.
    ///
    /// On a malformed record, everything decoded before it is still in `out`
    /// and the bad slot stays at the front of the buffer. The decoder should be
    /// dropped with its connection after an error.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<TradeRecord>) -> DecodeResult<usize> {
        self.bytes_fed += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        let mut decoded = 0;
        let mut failure = None;
        for slot in self.buffer.chunks_exact(RECORD_SIZE) {
            match decode_record(slot) {
                Ok(record) => {
                    out.push(record);
                    decoded += 1;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.buffer.drain(..decoded * RECORD_SIZE);
        self.records_decoded += decoded as u64;
        match failure {
            Some(e) => Err(e),
            None => Ok(decoded),
        }
    }

    /// Bytes held back waiting for the rest of a record
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_clean(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn records_decoded(&self) -> u64 {
        self.records_decoded
    }

    pub fn bytes_fed(&self) -> u64 {
        self.bytes_fed
    }
}
