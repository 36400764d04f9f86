//! Wire format encoding and decoding.
//!
//! Implements the 5-byte header format:
//! ```text
//! ┌────────┬────────────┐
//! │ Kind   │ Length     │
//! │ 1 byte │ 4 bytes    │
//! │        │ uint32 BE  │
//! └────────┴────────────┘
//! ```
//!
//! Multi-byte integers are Big Endian.

use crate::error::{CallError, Result};

/// Header size in bytes (fixed, exactly 5).
pub const HEADER_SIZE: usize = 5;

/// Default maximum payload size (64 KiB).
///
/// Payloads here are single MsgPack-encoded numeric messages; anything
/// near this limit indicates a corrupted or hostile stream.
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 64 * 1024;

/// Frame kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// Client-to-server input value ([`super::ValueRequest`]).
    Value = 0x01,
    /// Server-to-client running aggregate ([`super::MaxResponse`]).
    Result = 0x02,
    /// Server-to-client terminal rejection ([`super::Reject`]).
    Reject = 0x03,
}

impl FrameKind {
    /// Decode a kind byte, `None` for unknown discriminants.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameKind::Value),
            0x02 => Some(FrameKind::Result),
            0x03 => Some(FrameKind::Reject),
            _ => None,
        }
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl Header {
    /// Create a new header.
    pub fn new(kind: FrameKind, payload_length: u32) -> Self {
        Self {
            kind,
            payload_length,
        }
    }

    /// Encode header to bytes (Big Endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.kind as u8;
        buf[1..5].copy_from_slice(&self.payload_length.to_be_bytes());
        buf
    }

    /// Decode header from bytes.
    ///
    /// The buffer must hold at least [`HEADER_SIZE`] bytes; callers check
    /// length before decoding. Unknown kind bytes are a protocol error.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        debug_assert!(buf.len() >= HEADER_SIZE);
        let kind = FrameKind::from_u8(buf[0])
            .ok_or_else(|| CallError::Protocol(format!("unknown frame kind 0x{:02x}", buf[0])))?;
        Ok(Self {
            kind,
            payload_length: u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
        })
    }

    /// Validate the payload length against a limit.
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.payload_length > max_payload_size {
            return Err(CallError::Protocol(format!(
                "payload size {} exceeds maximum {}",
                self.payload_length, max_payload_size
            )));
        }
        Ok(())
    }
}
