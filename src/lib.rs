//! # maxwire
//!
//! Duplex streaming running-maximum protocol.
//!
//! One call: a client pushes a finite sequence of non-negative integers
//! over a bidirectional byte stream while concurrently consuming the
//! peer's running aggregates. Send and receive progress independently;
//! failure on either path cancels the other, the first error wins, and
//! both paths are fully stopped before the call returns.
//!
//! ## Architecture
//!
//! - **Wire protocol**: 5-byte header + MsgPack payload per frame; write-side
//!   shutdown (half-close) is the end-of-stream signal in each direction.
//! - **Call orchestrator** ([`run_duplex_max`]): spawns a send driver and a
//!   receive driver over the split stream, shares only a cancellation token
//!   and a first-writer-wins error slot between them.
//! - **Server loop** ([`serve_call`]): the peer endpoint; validates inputs,
//!   feeds the [`Reducer`], emits a result frame on every aggregate change.
//!
//! ## Example
//!
//! ```ignore
//! use maxwire::{run_duplex_max, serve_call, CallOptions, RunningMax};
//!
//! #[tokio::main]
//! async fn main() -> maxwire::Result<()> {
//!     let (client, server) = tokio::io::duplex(4096);
//!     tokio::spawn(serve_call(server, RunningMax::new()));
//!
//!     let max = run_duplex_max(client, vec![1, 5, 3, 6, 2, 6], CallOptions::default()).await?;
//!     assert_eq!(max, Some(6));
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod reducer;
pub mod server;
#[cfg(unix)]
pub mod transport;

mod call;
mod drivers;

pub use call::{run_duplex_max, CallOptions, DEFAULT_READ_BUFFER_SIZE};
pub use error::{CallError, CancelReason, ErrorCategory, Result, Side};
pub use reducer::{Reducer, RunningMax};
pub use server::serve_call;
