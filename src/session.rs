/// Session controller: one connection, one request, one response stream.
///
/// `PacketSource` is what the recovery orchestrator drives. `TcpSession` is
/// the TCP implementation; each call opens a fresh connection and drops it
/// before returning, so at most one connection is ever open.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::decoder::StreamDecoder;
use crate::error::{SessionError, SessionResult};
use crate::protocol::{RequestFrame, TradeRecord, RECORD_SIZE};

const READ_BUF_SIZE: usize = 8 * 1024;

/// Everything the stream-all phase produced before the connection ended
#[derive(Debug, Default)]
pub struct StreamAll {
    /// Records in arrival order
    pub records: Vec<TradeRecord>,
    /// Raw bytes read off the connection
    pub bytes_read: u64,
    /// Set when the phase ended on an error rather than a server close
    pub interrupted: Option<SessionError>,
}

/// Source of trade records: a full stream plus single-record resends
#[async_trait]
pub trait PacketSource: Send {
    /// Request every record and read until the server closes.
    /// `Err` only when the connection could not be established.
    async fn stream_all(&mut self) -> SessionResult<StreamAll>;

    /// Request one record by sequence on a new connection.
    /// `Ok(None)` when the server closed without sending a full record.
    async fn recover_one(&mut self, sequence: i32) -> SessionResult<Option<TradeRecord>>;
}

#[derive(Debug, Clone)]
pub struct TcpSession {
    addr: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl TcpSession {
    pub fn new(config: &ClientConfig) -> Self {
        TcpSession {
            addr: config.addr(),
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Exchange address every connection goes to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> SessionResult<TcpStream> {
        let attempt = TcpStream::connect(self.addr.as_str());
        let result = match self.connect_timeout {
            Some(limit) => match timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no connection within {limit:?}"),
                )),
            },
            None => attempt.await,
        };

        result.map_err(|source| SessionError::Connect {
            addr: self.addr.clone(),
            source,
        })
    }

    async fn read_chunk(
        &self,
        stream: &mut TcpStream,
        buf: &mut [u8],
        waiting_for: &'static str,
    ) -> SessionResult<usize> {
        let read = stream.read(buf);
        match self.read_timeout {
            Some(limit) => Ok(timeout(limit, read)
                .await
                .map_err(|_| SessionError::Timeout(limit, waiting_for))??),
            None => Ok(read.await?),
        }
    }

    async fn drain_stream(
        &self,
        stream: &mut TcpStream,
        decoder: &mut StreamDecoder,
        records: &mut Vec<TradeRecord>,
    ) -> SessionResult<()> {
        stream.write_all(&RequestFrame::stream_all().encode()).await?;

        let mut buf = vec![0u8; READ_BUF_SIZE];
        loop {
            let n = self.read_chunk(stream, &mut buf, "stream data").await?;
            if n == 0 {
                return Ok(());
            }
            let before = records.len();
            let decoded = decoder.feed(&buf[..n], records);
            for record in &records[before..] {
                debug!(sequence = record.sequence, symbol = %record.symbol, "received record");
            }
            decoded?;
        }
    }
}

#[async_trait]
impl PacketSource for TcpSession {
    async fn stream_all(&mut self) -> SessionResult<StreamAll> {
        let mut stream = self.connect().await?;
        info!(addr = %self.addr, "connected, requesting full stream");

        let mut decoder = StreamDecoder::new();
        let mut records = Vec::new();
        let interrupted = self
            .drain_stream(&mut stream, &mut decoder, &mut records)
            .await
            .err();

        match &interrupted {
            None => info!(records = records.len(), "stream closed by server"),
            Some(err) => warn!(records = records.len(), error = %err, "stream ended on error"),
        }
        if !decoder.is_clean() {
            warn!(bytes = decoder.pending(), "discarding undecoded bytes at end of stream");
        }

        Ok(StreamAll {
            records,
            bytes_read: decoder.bytes_fed(),
            interrupted,
        })
    }

    async fn recover_one(&mut self, sequence: i32) -> SessionResult<Option<TradeRecord>> {
        let frame =
            RequestFrame::resend(sequence).ok_or(SessionError::SequenceOutOfRange(sequence))?;

        let mut stream = self.connect().await?;
        stream.write_all(&frame.encode()).await?;
        debug!(sequence, "resend requested");

        let mut decoder = StreamDecoder::new();
        let mut buf = [0u8; RECORD_SIZE * 4];
        loop {
            let n = self.read_chunk(&mut stream, &mut buf, "resend reply").await?;
            if n == 0 {
                if !decoder.is_clean() {
                    warn!(sequence, bytes = decoder.pending(), "resend reply truncated");
                }
                return Ok(None);
            }

            let mut batch = Vec::new();
            let decoded = decoder.feed(&buf[..n], &mut batch);
            if let Some(record) = batch.into_iter().next() {
                // One record is all a resend carries; close our side now
                if let Err(err) = stream.shutdown().await {
                    debug!(error = %err, "shutdown after resend failed");
                }
                return Ok(Some(record));
            }
            decoded?;
        }
    }
}
