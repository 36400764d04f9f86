//! Send and receive drivers - the two concurrent halves of a duplex call.
//!
//! Each driver owns one direction of the stream and shares exactly two
//! things with its sibling: the cancellation token and the first-writer-wins
//! error slot. Everything else (loop state, the running aggregate) is
//! exclusively owned. Drivers never cancel the token themselves; the
//! orchestrator does that after observing a completion.
//!
//! Both suspension points (frame write, stream read) sit inside a biased
//! `select!` with the cancellation token checked first, so a triggered
//! cancellation is observed before any further I/O is started.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::call::{CallOptions, ErrorSlot};
use crate::error::{CallError, Result, Side};
use crate::protocol::{
    build_frame, FrameBuffer, FrameKind, MaxResponse, Reject, RejectCode, ValueRequest,
};
use crate::reducer::{Reducer, RunningMax};

/// Write the inputs in sequence order, observing cancellation between
/// elements, then half-close the send direction exactly once.
pub(crate) async fn send_driver<W>(
    mut writer: W,
    inputs: Vec<i64>,
    token: CancellationToken,
    slot: ErrorSlot,
) where
    W: AsyncWrite + Unpin,
{
    for number in inputs {
        let bytes = match build_frame(FrameKind::Value, &ValueRequest { number }) {
            Ok(bytes) => bytes,
            Err(err) => {
                slot.record(err);
                break;
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("send driver observed cancellation, stopping");
                break;
            }
            res = write_frame(&mut writer, &bytes) => match res {
                Ok(()) => tracing::debug!(number, "sent input"),
                Err(err) => {
                    slot.record(CallError::transport(Side::Send, err));
                    break;
                }
            },
        }
    }

    // Half-close on every exit path: the peer reads end-of-stream as "no
    // more inputs will arrive". A failure here never overwrites an earlier
    // error (first-writer-wins).
    if let Err(err) = writer.shutdown().await {
        slot.record(CallError::transport(Side::Send, err));
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

/// Read result frames until end-of-stream, a rejection, an error, or
/// cancellation. Returns the final aggregate; on any failure path the error
/// is recorded in the slot and the aggregate is withheld.
pub(crate) async fn receive_driver<R>(
    mut reader: R,
    token: CancellationToken,
    slot: ErrorSlot,
    opts: CallOptions,
) -> Option<i64>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::with_max_payload(opts.max_payload_size);
    let mut buf = vec![0u8; opts.read_buffer_size];
    let mut mirror = RunningMax::new();
    let mut aggregate: Option<i64> = None;

    loop {
        let n = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("receive driver observed cancellation, stopping");
                return aggregate;
            }
            res = reader.read(&mut buf) => match res {
                Ok(0) => {
                    if frame_buffer.has_partial() {
                        slot.record(frame_buffer.truncated());
                        return None;
                    }
                    tracing::debug!(?aggregate, "receive driver reached end of stream");
                    return aggregate;
                }
                Ok(n) => n,
                Err(err) => {
                    slot.record(CallError::transport(Side::Receive, err));
                    return None;
                }
            },
        };

        let frames = match frame_buffer.push(&buf[..n]) {
            Ok(frames) => frames,
            Err(err) => {
                slot.record(err);
                return None;
            }
        };

        for frame in frames {
            match frame.kind() {
                FrameKind::Result => {
                    let response: MaxResponse = match frame.decode_payload() {
                        Ok(response) => response,
                        Err(err) => {
                            slot.record(err);
                            return None;
                        }
                    };
                    match accept_result(response.result, aggregate, &mut mirror, opts.revalidate) {
                        Ok(next) => {
                            tracing::debug!(result = response.result, "received new aggregate");
                            aggregate = next;
                        }
                        Err(err) => {
                            slot.record(err);
                            return None;
                        }
                    }
                }
                FrameKind::Reject => {
                    match frame.decode_payload::<Reject>() {
                        Ok(reject) => slot.record(reject_to_error(reject)),
                        Err(err) => slot.record(err),
                    }
                    return None;
                }
                FrameKind::Value => {
                    slot.record(CallError::Protocol(
                        "peer sent a Value frame on the result path".to_string(),
                    ));
                    return None;
                }
            }
        }
    }
}

/// Validate one received aggregate and fold it into the local state.
///
/// The peer's contract says results are non-negative and strictly
/// increasing. With `revalidate` the value is re-fed through a local
/// running-maximum instead of being trusted verbatim.
fn accept_result(
    value: i64,
    aggregate: Option<i64>,
    mirror: &mut RunningMax,
    revalidate: bool,
) -> Result<Option<i64>> {
    if value < 0 {
        return Err(CallError::Domain {
            message: format!("peer emitted negative aggregate {value}"),
        });
    }

    if revalidate {
        mirror.feed(value);
        return Ok(mirror.current());
    }

    match aggregate {
        Some(current) if value <= current => Err(CallError::Protocol(format!(
            "peer aggregate went from {current} to {value}, expected strictly increasing"
        ))),
        _ => Ok(Some(value)),
    }
}

fn reject_to_error(reject: Reject) -> CallError {
    match reject.code {
        RejectCode::InvalidArgument => CallError::Domain {
            message: reject.message,
        },
        RejectCode::Internal => {
            CallError::Protocol(format!("peer internal error: {}", reject.message))
        }
    }
}
