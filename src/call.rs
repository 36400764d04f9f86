//! Call orchestration - owns one duplex call's lifecycle.
//!
//! [`run_duplex_max`] opens the call over any duplex byte stream, runs the
//! send and receive drivers as independent tasks, and guarantees that both
//! have finished before returning a single definitive outcome:
//!
//! - the receive driver reaching end-of-stream with no recorded error is
//!   the success exit (aggregate, `None` for an empty stream);
//! - the first recorded error - from either driver, or from the optional
//!   deadline - wins, cancellation unwinds the sibling, and that one error
//!   is returned.
//!
//! # Example
//!
//! ```ignore
//! use maxwire::{run_duplex_max, serve_call, CallOptions, RunningMax};
//!
//! let (client, server) = tokio::io::duplex(4096);
//! tokio::spawn(serve_call(server, RunningMax::new()));
//!
//! let max = run_duplex_max(client, vec![1, 5, 3, 6, 2, 6], CallOptions::default()).await?;
//! assert_eq!(max, Some(6));
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::drivers::{receive_driver, send_driver};
use crate::error::{CallError, CancelReason, Result};
use crate::protocol::DEFAULT_MAX_PAYLOAD_SIZE;

/// Default read buffer size for the receive driver.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024;

/// Configuration for one duplex call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Optional overall deadline; elapsing it cancels the call.
    pub deadline: Option<Duration>,
    /// Maximum accepted frame payload size.
    pub max_payload_size: u32,
    /// Read buffer size for the receive driver.
    pub read_buffer_size: usize,
    /// Re-run the reducer locally over received results instead of
    /// trusting the peer's filtered stream verbatim.
    pub revalidate: bool,
}

impl CallOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self {
            deadline: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            revalidate: false,
        }
    }

    /// Set an overall deadline for the call.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the maximum accepted frame payload size.
    pub fn max_payload_size(mut self, limit: u32) -> Self {
        self.max_payload_size = limit;
        self
    }

    /// Set the receive driver's read buffer size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Fold received results through a local reducer instead of trusting
    /// the peer's filtered stream.
    pub fn revalidate(mut self, enabled: bool) -> Self {
        self.revalidate = enabled;
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-assignment error cell shared by both drivers.
///
/// The first recorded error is the call's failure cause; later errors
/// (typically the sibling driver failing from the induced cancellation)
/// are discarded, never overwritten.
#[derive(Clone, Default)]
pub(crate) struct ErrorSlot {
    inner: Arc<Mutex<Option<CallError>>>,
}

impl ErrorSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record an error; first writer wins.
    pub(crate) fn record(&self, err: CallError) {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match &*slot {
            Some(first) => {
                tracing::debug!(first = %first, discarded = %err, "error slot already set");
            }
            None => *slot = Some(err),
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Take the recorded error out, leaving the slot empty.
    pub(crate) fn take(&self) -> Option<CallError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Run one duplex running-maximum call over `stream`.
///
/// Sends every element of `inputs` in order while concurrently consuming
/// the peer's aggregates, and returns the final aggregate (`None` when the
/// peer emitted nothing, i.e. the input sequence was empty) or the first
/// error either path hit. Both driver tasks are joined before this
/// function returns, whatever the outcome.
pub async fn run_duplex_max<S>(stream: S, inputs: Vec<i64>, opts: CallOptions) -> Result<Option<i64>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let token = CancellationToken::new();
    let slot = ErrorSlot::new();

    let mut send_task = tokio::spawn(send_driver(
        writer,
        inputs,
        token.clone(),
        slot.clone(),
    ));
    let mut recv_task = tokio::spawn(receive_driver(
        reader,
        token.clone(),
        slot.clone(),
        opts.clone(),
    ));

    let watchdog = opts.deadline.map(|limit| {
        let token = token.clone();
        let slot = slot.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!(?limit, "call deadline elapsed, cancelling");
                    slot.record(CallError::Cancelled {
                        reason: CancelReason::DeadlineExceeded,
                    });
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    });

    let aggregate = tokio::select! {
        send_res = &mut send_task => {
            // Send finishing cleanly is not terminal; only a failure has to
            // unwind the receive path.
            record_join_failure(send_res.err(), &slot);
            if slot.is_set() {
                token.cancel();
            }
            join_aggregate((&mut recv_task).await, &slot)
        }
        recv_res = &mut recv_task => {
            // No further results can arrive; stop the sender either way.
            token.cancel();
            let aggregate = join_aggregate(recv_res, &slot);
            record_join_failure((&mut send_task).await.err(), &slot);
            aggregate
        }
    };

    // Release the watchdog; cancelling after completion is harmless.
    token.cancel();
    if let Some(task) = watchdog {
        let _ = task.await;
    }

    match slot.take() {
        Some(err) => Err(err),
        None => Ok(aggregate),
    }
}

fn record_join_failure(err: Option<JoinError>, slot: &ErrorSlot) {
    if let Some(err) = err {
        tracing::error!(%err, "driver task failed to join");
        slot.record(CallError::Protocol(format!("driver task failed: {err}")));
    }
}

fn join_aggregate(res: std::result::Result<Option<i64>, JoinError>, slot: &ErrorSlot) -> Option<i64> {
    match res {
        Ok(aggregate) => aggregate,
        Err(err) => {
            record_join_failure(Some(err), slot);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Side;

    fn io_err(kind: std::io::ErrorKind) -> CallError {
        CallError::transport(Side::Send, std::io::Error::new(kind, "boom"))
    }

    #[test]
    fn test_error_slot_first_writer_wins() {
        let slot = ErrorSlot::new();
        slot.record(CallError::Domain {
            message: "first".into(),
        });
        slot.record(io_err(std::io::ErrorKind::BrokenPipe));

        let err = slot.take().unwrap();
        assert!(matches!(err, CallError::Domain { ref message } if message == "first"));
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_error_slot_empty_by_default() {
        let slot = ErrorSlot::new();
        assert!(!slot.is_set());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_error_slot_shared_across_clones() {
        let slot = ErrorSlot::new();
        let clone = slot.clone();
        clone.record(io_err(std::io::ErrorKind::ConnectionReset));
        assert!(slot.is_set());
    }

    #[test]
    fn test_options_builder() {
        let opts = CallOptions::new()
            .deadline(Duration::from_secs(3))
            .max_payload_size(512)
            .read_buffer_size(256)
            .revalidate(true);

        assert_eq!(opts.deadline, Some(Duration::from_secs(3)));
        assert_eq!(opts.max_payload_size, 512);
        assert_eq!(opts.read_buffer_size, 256);
        assert!(opts.revalidate);
    }

    #[test]
    fn test_options_defaults() {
        let opts = CallOptions::default();
        assert_eq!(opts.deadline, None);
        assert_eq!(opts.max_payload_size, DEFAULT_MAX_PAYLOAD_SIZE);
        assert_eq!(opts.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert!(!opts.revalidate);
    }
}
