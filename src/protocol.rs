/// Wire format of the trade feed.
///
/// Request frame: 2 bytes
///   - call_type: i8 (1 = stream all, 2 = resend one)
///   - param: one byte (resend sequence for call type 2, 0 otherwise)
///
/// Response record: 17 bytes, no header, no length prefix
///   - symbol: 4 bytes ASCII, NUL padded
///   - side: 1 byte ASCII ('B' or 'S')
///   - quantity: i32 big-endian
///   - price: i32 big-endian
///   - sequence: i32 big-endian

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::decoder::{DecodeError, DecodeResult};

pub const SYMBOL_SIZE: usize = 4;
pub const RECORD_SIZE: usize = 17;
pub const REQUEST_SIZE: usize = 2;

const SIDE_OFFSET: usize = 4;
const QUANTITY_OFFSET: usize = 5;
const PRICE_OFFSET: usize = 9;
const SEQUENCE_OFFSET: usize = 13;

const FILL_BYTE: u8 = 0;

#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    StreamAll = 1,
    Resend = 2,
}

impl CallType {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            1 => Some(CallType::StreamAll),
            2 => Some(CallType::Resend),
            _ => None,
        }
    }
}

/// Outbound control message, written once right after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub call_type: CallType,
    pub param: u8,
}

impl RequestFrame {
    pub fn stream_all() -> Self {
        RequestFrame {
            call_type: CallType::StreamAll,
            param: 0,
        }
    }

    /// The resend parameter is a single byte, so only sequences 0..=255 can
    /// be requested. Returns None for anything wider.
    pub fn resend(sequence: i32) -> Option<Self> {
        let param = u8::try_from(sequence).ok()?;
        Some(RequestFrame {
            call_type: CallType::Resend,
            param,
        })
    }

    pub fn encode(&self) -> [u8; REQUEST_SIZE] {
        [self.call_type as i8 as u8, self.param]
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < REQUEST_SIZE {
            return None;
        }
        let call_type = CallType::from_i8(buf[0] as i8)?;
        Some(RequestFrame {
            call_type,
            param: buf[1],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "S")]
    Sell,
}

impl Side {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            b'B' => Some(Side::Buy),
            b'S' => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Side::Buy => b'B',
            Side::Sell => b'S',
        }
    }
}

/// One decoded trade event. `sequence` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    #[serde(rename = "buysellindicator")]
    pub side: Side,
    pub quantity: i32,
    pub price: i32,
    #[serde(rename = "packetSequence")]
    pub sequence: i32,
}

/// Decode one record from the first `RECORD_SIZE` bytes of `buf`.
pub fn decode_record(buf: &[u8]) -> DecodeResult<TradeRecord> {
    if buf.len() < RECORD_SIZE {
        return Err(DecodeError::BufferTooSmall {
            need: RECORD_SIZE,
            have: buf.len(),
        });
    }

    let raw_symbol = &buf[..SYMBOL_SIZE];
    if !raw_symbol.is_ascii() {
        return Err(DecodeError::MalformedRecord("non-ascii symbol"));
    }
    let symbol: String = raw_symbol
        .iter()
        .filter(|&&b| b != FILL_BYTE)
        .map(|&b| b as char)
        .collect();

    let side_byte = buf[SIDE_OFFSET];
    let side = Side::from_u8(side_byte).ok_or(DecodeError::InvalidSide(side_byte))?;

    Ok(TradeRecord {
        symbol,
        side,
        quantity: BigEndian::read_i32(&buf[QUANTITY_OFFSET..PRICE_OFFSET]),
        price: BigEndian::read_i32(&buf[PRICE_OFFSET..SEQUENCE_OFFSET]),
        sequence: BigEndian::read_i32(&buf[SEQUENCE_OFFSET..RECORD_SIZE]),
    })
}

/// Server-side encoding of a record; used by the demo exchange and tests.
pub fn encode_record(record: &TradeRecord) -> DecodeResult<[u8; RECORD_SIZE]> {
    let symbol = record.symbol.as_bytes();
    if symbol.len() > SYMBOL_SIZE || !symbol.is_ascii() {
        return Err(DecodeError::MalformedRecord("symbol must be at most 4 ascii bytes"));
    }

    let mut buf = [FILL_BYTE; RECORD_SIZE];
    buf[..symbol.len()].copy_from_slice(symbol);
    buf[SIDE_OFFSET] = record.side.as_u8();
    BigEndian::write_i32(&mut buf[QUANTITY_OFFSET..PRICE_OFFSET], record.quantity);
    BigEndian::write_i32(&mut buf[PRICE_OFFSET..SEQUENCE_OFFSET], record.price);
    BigEndian::write_i32(&mut buf[SEQUENCE_OFFSET..RECORD_SIZE], record.sequence);
    Ok(buf)
}

// Record layout must add up to the fixed wire width
const _: () = assert!(SEQUENCE_OFFSET + 4 == RECORD_SIZE);
