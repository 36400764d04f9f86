//! Error types for maxwire.
//!
//! Every failure surfaced at the call boundary is a [`CallError`]. Callers
//! that need to branch on failure class without matching variants can use
//! [`CallError::category`]: transport faults may be worth retrying by the
//! caller, domain rejections never are, and cancellations mean "we gave up"
//! rather than "the peer rejected our input".

use std::fmt;

use thiserror::Error;

/// Which half of the duplex call produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The send path (pushing values to the peer).
    Send,
    /// The receive path (consuming results from the peer).
    Receive,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Send => f.write_str("send"),
            Side::Receive => f.write_str("receive"),
        }
    }
}

/// Why a call was cancelled before natural completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The configured deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Coarse error class, stable across variant details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Channel open/read/write failure.
    Transport,
    /// A value violated the numeric domain.
    Domain,
    /// The call was cancelled (deadline or induced shutdown).
    Cancelled,
    /// Framing, codec, or peer-contract violation.
    Protocol,
}

/// Main error type for all maxwire operations.
#[derive(Debug, Error)]
pub enum CallError {
    /// I/O failure on one half of the duplex stream.
    #[error("transport failure on {side} path: {source}")]
    Transport {
        /// Which driver hit the failure.
        side: Side,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A value violated the numeric domain (e.g. a negative input).
    #[error("domain violation: {message}")]
    Domain {
        /// Peer-supplied or locally produced rejection detail.
        message: String,
    },

    /// The call was cancelled before natural completion.
    #[error("call cancelled: {reason}")]
    Cancelled {
        /// What triggered the cancellation.
        reason: CancelReason,
    },

    /// I/O failure while setting up the channel (bind/accept/connect),
    /// before either call path exists.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing or peer-contract violation (bad kind, torn frame, etc.).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// MsgPack serialization error.
    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl CallError {
    /// Classify this error for caller-side policy decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CallError::Transport { .. } | CallError::Io(_) => ErrorCategory::Transport,
            CallError::Domain { .. } => ErrorCategory::Domain,
            CallError::Cancelled { .. } => ErrorCategory::Cancelled,
            CallError::Protocol(_) | CallError::Encode(_) | CallError::Decode(_) => {
                ErrorCategory::Protocol
            }
        }
    }

    /// Whether a caller-level retry of the whole call could plausibly help.
    ///
    /// Only transport faults qualify; a domain rejection will fail again
    /// with the same inputs.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Shorthand for a transport error on the given side.
    pub(crate) fn transport(side: Side, source: std::io::Error) -> Self {
        CallError::Transport { side, source }
    }
}

/// Result type alias using CallError.
pub type Result<T> = std::result::Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(
            CallError::transport(Side::Send, io).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            CallError::Domain {
                message: "negative".into()
            }
            .category(),
            ErrorCategory::Domain
        );
        assert_eq!(
            CallError::Cancelled {
                reason: CancelReason::DeadlineExceeded
            }
            .category(),
            ErrorCategory::Cancelled
        );
        assert_eq!(
            CallError::Protocol("bad kind".into()).category(),
            ErrorCategory::Protocol
        );
    }

    #[test]
    fn test_retryable_only_for_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(CallError::transport(Side::Receive, io).is_retryable());
        assert!(!CallError::Domain {
            message: "negative".into()
        }
        .is_retryable());
        assert!(!CallError::Cancelled {
            reason: CancelReason::DeadlineExceeded
        }
        .is_retryable());
    }

    #[test]
    fn test_display_includes_side() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err = CallError::transport(Side::Send, io);
        assert!(err.to_string().contains("send path"));
    }
}
