//! Live connection handles.
//!
//! A [`ConnectionHandle`] is an upgraded, bidirectional stream attached to a
//! request (for example a realtime socket). The transport layer creates it
//! and owns its lifecycle; actions receive a clone of the handle through a
//! [`LiveConnection`](crate::binding::LiveConnection) parameter.
//!
//! Reads and writes go through separate halves, so one task can wait on
//! `recv` while another calls `send`.
//!
//! # Example
//!
//! ```
//! use actionwire::connection::ConnectionHandle;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let (client, mut server) = tokio::io::duplex(64);
//! let conn = ConnectionHandle::new(client);
//! conn.send(b"ping").await.unwrap();
//!
//! use tokio::io::AsyncReadExt;
//! let mut buf = [0u8; 4];
//! server.read_exact(&mut buf).await.unwrap();
//! assert_eq!(&buf, b"ping");
//! # });
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use crate::error::{ActionError, Result};

/// Any duplex byte stream a connection can wrap.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> DuplexStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

type BoxedStream = Box<dyn DuplexStream>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a live duplex connection.
///
/// Cloning is cheap; all clones refer to the same stream and compare equal.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: u64,
    reader: Arc<Mutex<ReadHalf<BoxedStream>>>,
    writer: Arc<Mutex<WriteHalf<BoxedStream>>>,
}

impl ConnectionHandle {
    /// Wrap a stream, assigning it a process-unique id.
    pub fn new<S: DuplexStream>(stream: S) -> Self {
        let boxed: BoxedStream = Box::new(stream);
        let (reader, writer) = tokio::io::split(boxed);
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Attached live connection {}", id);

        Self {
            id,
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Process-unique connection id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether both handles refer to the same connection.
    #[inline]
    pub fn same_as(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }

    /// Write all bytes and flush.
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read available bytes into `buf`.
    ///
    /// Returns [`ActionError::ConnectionClosed`] when the peer has closed
    /// its side and no bytes remain.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let mut reader = self.reader.lock().await;
        match reader.read(buf).await? {
            0 if !buf.is_empty() => Err(ActionError::ConnectionClosed),
            n => Ok(n),
        }
    }

    /// Shut down the write side.
    pub async fn shutdown(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_ids_are_unique() {
        let (a, _a_peer) = duplex(16);
        let (b, _b_peer) = duplex(16);
        let a = ConnectionHandle::new(a);
        let b = ConnectionHandle::new(b);

        assert_ne!(a.id(), b.id());
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_clone_is_same_connection() {
        let (stream, _peer) = duplex(16);
        let conn = ConnectionHandle::new(stream);
        let clone = conn.clone();

        assert!(conn.same_as(&clone));
        assert_eq!(conn, clone);
    }

    #[tokio::test]
    async fn test_send_and_recv() {
        let (stream, mut peer) = duplex(64);
        let conn = ConnectionHandle::new(stream);

        conn.send(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        peer.write_all(b"world").await.unwrap();
        let mut buf = [0u8; 16];
        let n = conn.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"world");
    }

    #[tokio::test]
    async fn test_recv_after_peer_close() {
        let (stream, peer) = duplex(64);
        let conn = ConnectionHandle::new(stream);
        drop(peer);

        let mut buf = [0u8; 8];
        let err = conn.recv(&mut buf).await.unwrap_err();
        assert!(matches!(err, ActionError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_shutdown_signals_eof_to_peer() {
        let (stream, mut peer) = duplex(64);
        let conn = ConnectionHandle::new(stream);

        conn.send(b"bye").await.unwrap();
        conn.shutdown().await.unwrap();

        let mut buf = Vec::new();
        peer.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"bye");

        // The read side stays usable after the write side is shut down.
        peer.write_all(b"late").await.unwrap();
        let mut buf = [0u8; 8];
        let n = conn.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"late");
    }

    #[tokio::test]
    async fn test_concurrent_send_while_receiving() {
        let (stream, mut peer) = duplex(64);
        let conn = ConnectionHandle::new(stream);

        let reader = conn.clone();
        let pending = tokio::spawn(async move {
            let mut buf = [0u8; 4];
            let n = reader.recv(&mut buf).await.unwrap();
            buf[..n].to_vec()
        });

        // The writer half is not blocked by the pending read.
        conn.send(b"out").await.unwrap();
        let mut out = [0u8; 3];
        peer.read_exact(&mut out).await.unwrap();
        assert_eq!(&out, b"out");

        peer.write_all(b"in").await.unwrap();
        assert_eq!(pending.await.unwrap(), b"in");
    }
}
