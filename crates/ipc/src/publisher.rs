//! Publisher lifecycle
//!
//! A [`Publisher`] owns one chain's pair of outbound streams. Each
//! [`EventStream`] couples a bounded queue to a dedicated drain worker that
//! pops events in arrival order, encodes them, and broadcasts the frame on
//! its socket.
//!
//! # Lifecycle
//!
//! ```text
//! open:     bind consensus socket ──► bind decisions socket
//!              │ (second bind fails: first is fully torn down, no residue)
//!              ▼
//!           spawn drain workers, build ChainBridge over both queues
//!
//! shutdown: detach bridge ──► cancel workers (backlog discarded)
//!              ──► join ≤ shutdown_timeout (abort stragglers)
//!              ──► close both sockets
//! ```
//!
//! The two sockets share fate: both bound or neither, both closed together.

use std::sync::Arc;

use chaintap_protocol::{encode_event, ChainId, Event, StreamKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge::{ChainBridge, EventSink};
use crate::config::IpcConfig;
use crate::endpoint::EndpointAllocator;
use crate::socket::PubSocket;
use crate::Result;

/// One outbound stream: queue, drain worker, socket
#[derive(Debug)]
struct EventStream {
    kind: StreamKind,
    socket: Arc<PubSocket>,
    tx: mpsc::Sender<Event>,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
}

impl EventStream {
    /// Bind the stream's socket and start its drain worker
    fn open(
        chain: &ChainId,
        kind: StreamKind,
        cfg: &IpcConfig,
        allocator: &EndpointAllocator,
    ) -> Result<Self> {
        let endpoint = allocator.allocate(chain, kind);
        let socket = Arc::new(PubSocket::bind(endpoint, cfg.write_timeout)?);

        let (tx, rx) = mpsc::channel(cfg.queue_capacity.max(1));
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(drain_loop(rx, Arc::clone(&socket), cancel.clone()));

        debug!(chain = %chain.short(), stream = %kind, url = %socket.endpoint().url(),
            "stream opened");
        Ok(Self {
            kind,
            socket,
            tx,
            worker,
            cancel,
        })
    }

    /// URL subscribers connect to
    fn url(&self) -> String {
        self.socket.endpoint().url()
    }

    /// Stop the worker, discard its backlog, close the socket
    async fn shutdown(mut self, cfg: &IpcConfig) {
        self.cancel.cancel();
        drop(self.tx);

        match tokio::time::timeout(cfg.shutdown_timeout, &mut self.worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(stream = %self.kind, error = %e, "drain worker join failed");
            }
            Err(_) => {
                warn!(stream = %self.kind, "drain worker overran shutdown window, aborting");
                self.worker.abort();
            }
        }

        self.socket.close().await;
    }
}

/// Pops events in arrival order and broadcasts their frames
///
/// Cancellation discards whatever is still queued: unpublish means stop, not
/// drain.
async fn drain_loop(
    mut rx: mpsc::Receiver<Event>,
    socket: Arc<PubSocket>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => {
                    let frame = encode_event(&event);
                    socket.broadcast(frame).await;
                }
                None => break,
            }
        }
    }
}

/// The live pair of outbound event streams bound to one chain
#[derive(Debug)]
pub struct Publisher {
    chain: ChainId,
    consensus: EventStream,
    decisions: EventStream,
    bridge: Arc<ChainBridge>,
}

impl Publisher {
    /// Bind both stream sockets and wire up the bridge
    ///
    /// Atomic: if the decisions socket fails to bind, the consensus stream is
    /// fully torn down before the error returns.
    pub async fn open(
        chain: ChainId,
        cfg: &IpcConfig,
        allocator: &EndpointAllocator,
    ) -> Result<Self> {
        let consensus = EventStream::open(&chain, StreamKind::Consensus, cfg, allocator)?;
        let decisions = match EventStream::open(&chain, StreamKind::Decisions, cfg, allocator) {
            Ok(stream) => stream,
            Err(e) => {
                consensus.shutdown(cfg).await;
                return Err(e);
            }
        };

        let bridge = Arc::new(ChainBridge::new(
            chain,
            consensus.tx.clone(),
            decisions.tx.clone(),
        ));

        Ok(Self {
            chain,
            consensus,
            decisions,
            bridge,
        })
    }

    /// Chain this publisher serves
    #[inline]
    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// URL of the consensus stream
    pub fn consensus_url(&self) -> String {
        self.consensus.url()
    }

    /// URL of the decisions stream
    pub fn decisions_url(&self) -> String {
        self.decisions.url()
    }

    /// The sink to install on the engine's event paths
    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.bridge) as Arc<dyn EventSink>
    }

    /// Bridge handle (drop counters, detach state)
    pub fn bridge(&self) -> &Arc<ChainBridge> {
        &self.bridge
    }

    /// Current publisher statistics
    pub async fn stats(&self) -> PublisherStats {
        PublisherStats {
            consensus_dropped: self.bridge.consensus_dropped(),
            decisions_dropped: self.bridge.decisions_dropped(),
            consensus_subscribers: self.consensus.socket.subscriber_count().await,
            decisions_subscribers: self.decisions.socket.subscriber_count().await,
        }
    }

    /// Detach the bridge, stop both workers, close both sockets
    ///
    /// Returns only once all resources are released.
    pub async fn shutdown(self, cfg: &IpcConfig) {
        self.bridge.detach();
        self.consensus.shutdown(cfg).await;
        self.decisions.shutdown(cfg).await;
        debug!(chain = %self.chain.short(), "publisher shut down");
    }
}

/// Snapshot of one publisher's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherStats {
    /// Consensus events dropped to a full queue
    pub consensus_dropped: u64,
    /// Decision events dropped to a full queue
    pub decisions_dropped: u64,
    /// Subscribers connected to the consensus stream
    pub consensus_subscribers: usize,
    /// Subscribers connected to the decisions stream
    pub decisions_subscribers: usize,
}

#[cfg(test)]
#[path = "publisher_test.rs"]
mod tests;
