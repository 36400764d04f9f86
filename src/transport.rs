//! Unix-domain-socket transport for cross-process calls.
//!
//! One listener serves one endpoint; each accepted connection carries one
//! duplex call. In-process tests use `tokio::io::duplex` instead and never
//! touch this module.
//!
//! # Example
//!
//! ```ignore
//! use maxwire::transport::{generate_socket_path, CallListener, CallStream};
//!
//! let path = generate_socket_path();
//! let listener = CallListener::bind(&path).await?;
//! let server_side = listener.accept().await?;
//! let client_side = CallStream::connect(&path).await?;
//! ```

use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};

use crate::error::Result;

/// Generate a unique socket path for this process.
///
/// Format: `/tmp/maxwire-{pid}-{nanos:x}.sock`.
pub fn generate_socket_path() -> PathBuf {
    let pid = std::process::id();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    PathBuf::from(format!("/tmp/maxwire-{}-{:x}.sock", pid, nanos))
}

/// Unix-domain-socket listener for incoming calls.
pub struct CallListener {
    listener: UnixListener,
    path: PathBuf,
}

impl CallListener {
    /// Bind to a socket path, removing any stale socket file first.
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        let listener = UnixListener::bind(&path)?;
        Ok(Self { listener, path })
    }

    /// Accept one connection; the stream carries one duplex call.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }

    /// Get the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CallListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Client-side connector.
pub struct CallStream;

impl CallStream {
    /// Connect to a listening endpoint.
    pub async fn connect(path: impl AsRef<Path>) -> Result<UnixStream> {
        Ok(UnixStream::connect(path.as_ref()).await?)
    }
}
