//! Frame struct with typed accessors.
//!
//! Represents a complete protocol frame with header and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.

use bytes::Bytes;

use super::wire_format::{FrameKind, Header, HEADER_SIZE};
use crate::codec::MsgPackCodec;
use crate::error::Result;

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Get the frame kind.
    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.header.kind
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decode the payload as MsgPack into `T`.
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        MsgPackCodec::decode(&self.payload)
    }
}

/// Build a complete frame as a single byte vector.
///
/// Encodes the message as MsgPack and prepends the header.
pub fn build_frame<T: serde::Serialize>(kind: FrameKind, message: &T) -> Result<Vec<u8>> {
    let payload = MsgPackCodec::encode(message)?;
    let header = Header::new(kind, payload.len() as u32);

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FrameBuffer, ValueRequest};

    #[test]
    fn test_frame_accessors() {
        let header = Header::new(FrameKind::Result, 5);
        let frame = Frame::new(header, Bytes::from_static(b"hello"));

        assert_eq!(frame.kind(), FrameKind::Result);
        assert_eq!(frame.payload(), b"hello");
    }

    #[test]
    fn test_build_frame_roundtrip() {
        let bytes = build_frame(FrameKind::Value, &ValueRequest { number: 42 }).unwrap();

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), FrameKind::Value);
        let decoded: ValueRequest = frames[0].decode_payload().unwrap();
        assert_eq!(decoded.number, 42);
    }

    #[test]
    fn test_build_frame_length_field() {
        let bytes = build_frame(FrameKind::Value, &ValueRequest { number: 1 }).unwrap();
        let header = Header::decode(&bytes[..HEADER_SIZE]).unwrap();
        assert_eq!(header.payload_length as usize, bytes.len() - HEADER_SIZE);
    }
}
