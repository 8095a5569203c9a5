//! One-to-many fan-out socket
//!
//! `PubSocket` binds a Unix listener at an endpoint, accepts subscriber
//! connections at any time, and broadcasts encoded frames to all of them.
//!
//! # Rules
//!
//! - **No replay**: a subscriber connecting after a frame was broadcast never
//!   sees it
//! - **Bounded writes**: subscriber writes run concurrently, each capped by
//!   the configured timeout; a slow or errored subscriber is disconnected,
//!   the rest of the stream is unaffected
//! - **Best-effort**: `broadcast` surfaces no error to the caller, it returns
//!   the delivered count
//! - **Idempotent close**: `close` can be called any number of times, on an
//!   already-errored socket included

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::endpoint::Endpoint;
use crate::{IpcError, Result};

/// Fan-out socket bound to one endpoint
#[derive(Debug)]
pub struct PubSocket {
    endpoint: Endpoint,
    conns: Arc<Mutex<Vec<UnixStream>>>,
    write_timeout: Duration,
    cancel: CancellationToken,
    accept_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PubSocket {
    /// Bind at `endpoint` and start accepting subscribers
    ///
    /// A leftover socket file is probed with a connect: a live listener on the
    /// other end surfaces [`IpcError::AddressInUse`], a refused connect means
    /// the file is stale from a dead process and is reclaimed.
    pub fn bind(endpoint: Endpoint, write_timeout: Duration) -> Result<Self> {
        let path = endpoint.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IpcError::bind(path.to_path_buf(), e))?;
        }

        if path.exists() {
            reclaim_stale(path)?;
        }

        let listener =
            UnixListener::bind(path).map_err(|e| IpcError::bind(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "socket bound");

        let conns = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&conns), cancel.clone()));

        Ok(Self {
            endpoint,
            conns,
            write_timeout,
            cancel,
            accept_task: parking_lot::Mutex::new(Some(accept_task)),
            closed: AtomicBool::new(false),
        })
    }

    /// Endpoint this socket is bound at
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of currently connected subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.conns.lock().await.len()
    }

    /// Write a frame to every connected subscriber
    ///
    /// Writes fan out concurrently, each bounded by the configured timeout;
    /// a stalled subscriber costs the frame one timeout window, not one per
    /// subscriber. A subscriber that times out or errors is dropped. Returns
    /// the number of subscribers the frame was delivered to.
    pub async fn broadcast(&self, frame: Bytes) -> usize {
        let mut conns = self.conns.lock().await;
        if conns.is_empty() {
            return 0;
        }

        let mut writes = JoinSet::new();
        for mut conn in conns.drain(..) {
            let frame = frame.clone();
            let write_timeout = self.write_timeout;
            writes.spawn(async move {
                match tokio::time::timeout(write_timeout, conn.write_all(&frame)).await {
                    Ok(Ok(())) => WriteOutcome::Delivered(conn),
                    Ok(Err(e)) => WriteOutcome::Errored(e),
                    Err(_) => WriteOutcome::TimedOut,
                }
            });
        }

        let mut delivered = 0;
        let mut alive = Vec::new();
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok(WriteOutcome::Delivered(conn)) => {
                    delivered += 1;
                    alive.push(conn);
                }
                Ok(WriteOutcome::Errored(e)) => {
                    debug!(path = %self.endpoint.path().display(), error = %e,
                        "dropping errored subscriber");
                }
                Ok(WriteOutcome::TimedOut) => {
                    warn!(path = %self.endpoint.path().display(),
                        timeout_ms = self.write_timeout.as_millis() as u64,
                        "dropping slow subscriber");
                }
                Err(e) => {
                    debug!(error = %e, "subscriber write task failed");
                }
            }
        }
        *conns = alive;

        trace!(delivered, "frame broadcast");
        delivered
    }

    /// Stop accepting, drop all subscribers, remove the socket file
    ///
    /// Idempotent and tolerant of an already-errored socket. After close, new
    /// connections to the endpoint are impossible.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cancel.cancel();
        let task = self.accept_task.lock().take();
        if let Some(task) = task {
            // The accept loop exits promptly on cancellation; a panic there
            // must not prevent resource release.
            let _ = task.await;
        }

        self.conns.lock().await.clear();

        let path = self.endpoint.path();
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "socket file removal failed");
            }
        }
        debug!(path = %path.display(), "socket closed");
    }
}

/// Result of one subscriber write within a broadcast
enum WriteOutcome {
    Delivered(UnixStream),
    Errored(std::io::Error),
    TimedOut,
}

/// Accepts subscriber connections until cancelled
async fn accept_loop(
    listener: UnixListener,
    conns: Arc<Mutex<Vec<UnixStream>>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    trace!("subscriber connected");
                    conns.lock().await.push(stream);
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept subscriber");
                }
            }
        }
    }
    // Listener drops here; the socket file goes away in close().
}

/// Handle a pre-existing socket file at `path`
fn reclaim_stale(path: &Path) -> Result<()> {
    match std::os::unix::net::UnixStream::connect(path) {
        Ok(_) => Err(IpcError::AddressInUse {
            path: path.to_path_buf(),
        }),
        Err(_) => {
            debug!(path = %path.display(), "reclaiming stale socket file");
            std::fs::remove_file(path).map_err(|e| IpcError::bind(path.to_path_buf(), e))
        }
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
