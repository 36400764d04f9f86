//! Typed wire messages carried in frame payloads.
//!
//! One message type per frame kind. All payloads are MsgPack-encoded
//! (see [`crate::codec::MsgPackCodec`]).

use serde::{Deserialize, Serialize};

/// Client-to-server input value (frame kind `Value`).
///
/// The domain is non-negative integers; the value travels as `i64` so the
/// server can observe and reject out-of-domain inputs instead of the codec
/// silently mangling them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRequest {
    /// The next input in the sequence.
    pub number: i64,
}

/// Server-to-client running aggregate (frame kind `Result`).
///
/// Emitted only when the aggregate changes, so consecutive results are
/// strictly increasing for the running-maximum reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxResponse {
    /// The latest aggregate value.
    pub result: i64,
}

/// Rejection code carried in a `Reject` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectCode {
    /// An input violated the numeric domain.
    InvalidArgument,
    /// The server failed for a reason unrelated to the inputs.
    Internal,
}

/// Server-to-client terminal rejection (frame kind `Reject`).
///
/// After sending this the server half-closes; no further results follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    /// Rejection class.
    pub code: RejectCode,
    /// Human-readable detail.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;

    #[test]
    fn test_value_request_roundtrip() {
        let req = ValueRequest { number: -3 };
        let bytes = MsgPackCodec::encode(&req).unwrap();
        let decoded: ValueRequest = MsgPackCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_reject_roundtrip() {
        let reject = Reject {
            code: RejectCode::InvalidArgument,
            message: "expected non-negative integer, got -3".to_string(),
        };
        let bytes = MsgPackCodec::encode(&reject).unwrap();
        let decoded: Reject = MsgPackCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, reject);
    }
}
