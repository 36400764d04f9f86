//! Single-call server loop - the peer endpoint of a duplex call.
//!
//! [`serve_call`] drives one call on an already-connected duplex stream:
//! it validates and feeds every incoming value to the reducer, writes a
//! result frame whenever the aggregate changes, and half-closes its own
//! write side once the client half-closes. Listener setup and connection
//! dispatch are the caller's concern (see [`crate::transport`]).

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{CallError, Result, Side};
use crate::protocol::{
    build_frame, FrameBuffer, FrameKind, MaxResponse, Reject, RejectCode, ValueRequest,
};
use crate::reducer::Reducer;

const READ_BUFFER_SIZE: usize = 4 * 1024;

/// Serve one duplex call to completion.
///
/// Returns the reducer on a clean finish so callers can inspect the final
/// state (and, in tests, the observed input sequence). A negative input
/// terminates the call: the client gets a structured `Reject` before the
/// write side closes, and the same domain error is returned here.
pub async fn serve_call<S, R>(mut stream: S, mut reducer: R) -> Result<R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Reducer,
{
    let mut frame_buffer = FrameBuffer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                if frame_buffer.has_partial() {
                    return Err(frame_buffer.truncated());
                }
                // Client half-closed cleanly; half-close our side too.
                stream
                    .shutdown()
                    .await
                    .map_err(|err| CallError::transport(Side::Send, err))?;
                tracing::debug!(aggregate = ?reducer.current(), "call finished");
                return Ok(reducer);
            }
            Ok(n) => n,
            Err(err) => return Err(CallError::transport(Side::Receive, err)),
        };

        let frames = match frame_buffer.push(&buf[..n]) {
            Ok(frames) => frames,
            Err(err) => {
                reject(&mut stream, RejectCode::Internal, &err.to_string()).await;
                return Err(err);
            }
        };

        for frame in frames {
            match frame.kind() {
                FrameKind::Value => {
                    let request: ValueRequest = match frame.decode_payload() {
                        Ok(request) => request,
                        Err(err) => {
                            reject(&mut stream, RejectCode::Internal, &err.to_string()).await;
                            return Err(err);
                        }
                    };

                    if request.number < 0 {
                        let message =
                            format!("expected non-negative integer, got {}", request.number);
                        tracing::warn!(number = request.number, "rejecting out-of-domain input");
                        reject(&mut stream, RejectCode::InvalidArgument, &message).await;
                        // Keep reading until the client half-closes so its
                        // in-flight sends don't hit a broken pipe before it
                        // sees the rejection.
                        drain(&mut stream, &mut buf).await;
                        return Err(CallError::Domain { message });
                    }

                    tracing::debug!(number = request.number, "received input");
                    if let Some(new_max) = reducer.feed(request.number) {
                        let bytes = build_frame(FrameKind::Result, &MaxResponse { result: new_max })?;
                        if let Err(err) = write_frame(&mut stream, &bytes).await {
                            return Err(CallError::transport(Side::Send, err));
                        }
                        tracing::debug!(new_max, "emitted new aggregate");
                    }
                }
                FrameKind::Result | FrameKind::Reject => {
                    let message = "unexpected result-path frame from client";
                    reject(&mut stream, RejectCode::Internal, message).await;
                    return Err(CallError::Protocol(message.to_string()));
                }
            }
        }
    }
}

async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, bytes: &[u8]) -> std::io::Result<()> {
    stream.write_all(bytes).await?;
    stream.flush().await
}

/// Best-effort terminal rejection: send the frame and half-close. The call
/// is already failing, so write errors here are only logged.
async fn reject<S: AsyncWrite + Unpin>(stream: &mut S, code: RejectCode, message: &str) {
    let reject = Reject {
        code,
        message: message.to_string(),
    };
    match build_frame(FrameKind::Reject, &reject) {
        Ok(bytes) => {
            if let Err(err) = write_frame(stream, &bytes).await {
                tracing::warn!(%err, "failed to send rejection");
            }
        }
        Err(err) => tracing::warn!(%err, "failed to encode rejection"),
    }
    if let Err(err) = stream.shutdown().await {
        tracing::warn!(%err, "failed to half-close after rejection");
    }
}

/// Discard remaining input until the client half-closes or errors.
async fn drain<S: AsyncRead + Unpin>(stream: &mut S, buf: &mut [u8]) {
    loop {
        match stream.read(buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::protocol::Frame;
    use crate::reducer::RunningMax;
    use tokio::io::duplex;

    async fn send_values(peer: &mut (impl AsyncWrite + Unpin), values: &[i64]) {
        for &number in values {
            let bytes = build_frame(FrameKind::Value, &ValueRequest { number }).unwrap();
            peer.write_all(&bytes).await.unwrap();
        }
        peer.shutdown().await.unwrap();
    }

    async fn read_results(peer: &mut (impl AsyncRead + Unpin)) -> Vec<Frame> {
        let mut frame_buffer = FrameBuffer::new();
        let mut buf = vec![0u8; 4096];
        let mut frames = Vec::new();
        loop {
            let n = peer.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            frames.extend(frame_buffer.push(&buf[..n]).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn test_emits_aggregate_only_on_change() {
        let (mut peer, local) = duplex(4096);
        let server = tokio::spawn(serve_call(local, RunningMax::new()));

        send_values(&mut peer, &[1, 5, 3, 6, 2, 6]).await;
        let frames = read_results(&mut peer).await;

        let results: Vec<i64> = frames
            .iter()
            .map(|frame| {
                assert_eq!(frame.kind(), FrameKind::Result);
                frame.decode_payload::<MaxResponse>().unwrap().result
            })
            .collect();
        assert_eq!(results, vec![1, 5, 6]);

        let reducer = server.await.unwrap().unwrap();
        assert_eq!(reducer.current(), Some(6));
    }

    #[tokio::test]
    async fn test_empty_call_finishes_with_no_results() {
        let (mut peer, local) = duplex(4096);
        let server = tokio::spawn(serve_call(local, RunningMax::new()));

        send_values(&mut peer, &[]).await;
        let frames = read_results(&mut peer).await;
        assert!(frames.is_empty());

        let reducer = server.await.unwrap().unwrap();
        assert_eq!(reducer.current(), None);
    }

    #[tokio::test]
    async fn test_negative_input_sends_reject_then_half_closes() {
        let (mut peer, local) = duplex(4096);
        let server = tokio::spawn(serve_call(local, RunningMax::new()));

        send_values(&mut peer, &[3, -4]).await;
        let frames = read_results(&mut peer).await;

        // First the aggregate for 3, then the rejection for -4.
        assert_eq!(frames.last().unwrap().kind(), FrameKind::Reject);
        let reject: Reject = frames.last().unwrap().decode_payload().unwrap();
        assert_eq!(reject.code, RejectCode::InvalidArgument);
        assert!(reject.message.contains("-4"));

        let err = server.await.unwrap().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Domain);
    }

    #[tokio::test]
    async fn test_unexpected_frame_kind_is_rejected() {
        let (mut peer, local) = duplex(4096);
        let server = tokio::spawn(serve_call(local, RunningMax::new()));

        let bytes = build_frame(FrameKind::Result, &MaxResponse { result: 1 }).unwrap();
        peer.write_all(&bytes).await.unwrap();
        peer.shutdown().await.unwrap();

        let frames = read_results(&mut peer).await;
        assert_eq!(frames.last().unwrap().kind(), FrameKind::Reject);

        let err = server.await.unwrap().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Protocol);
    }
}
