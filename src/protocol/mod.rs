//! Protocol module - wire format, framing, and message types.
//!
//! This module implements the binary protocol for the duplex call:
//! - 5-byte header encoding/decoding
//! - Frame buffer for accumulating partial reads
//! - Typed frame and message payloads
//!
//! End-of-stream is deliberately not a frame: half-closing the byte stream
//! (write-side shutdown) is the end-of-stream signal in each direction.

mod frame;
mod frame_buffer;
mod messages;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use messages::{MaxResponse, Reject, RejectCode, ValueRequest};
pub use wire_format::{FrameKind, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
