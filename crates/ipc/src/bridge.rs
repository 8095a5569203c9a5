//! Event bridge
//!
//! The bridge is the narrow hook the consensus engine calls inline on its
//! finalize/decide paths. It must complete in bounded time and never surface
//! a failure into the engine, so it does exactly one thing: a `try_send` onto
//! the matching stream's bounded queue.
//!
//! # Rules
//!
//! - **Never blocks**: full queue drops the newest event and bumps a counter
//! - **Never fails**: a closed queue (stream halted) is silently ignored
//! - **Detachable**: once `detach` runs, no further event is enqueued - the
//!   first step of unpublish

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use chaintap_protocol::{ChainId, ContainerId, DecisionStatus, Event};
use tokio::sync::mpsc;
use tracing::trace;

/// The hook installed into the engine's event paths
///
/// Implementations must be non-blocking and non-failing; the engine calls
/// them inline. Substitutable with a fake for testing.
pub trait EventSink: Send + Sync + 'static {
    /// A container was finalized by consensus
    fn finalize(&self, container_id: ContainerId, payload: Bytes);

    /// A transaction was decided
    fn decide(&self, container_id: ContainerId, payload: Bytes, status: DecisionStatus);
}

/// Bridge from one chain's engine callbacks to its publisher queues
#[derive(Debug)]
pub struct ChainBridge {
    chain: ChainId,
    consensus_tx: mpsc::Sender<Event>,
    decisions_tx: mpsc::Sender<Event>,
    detached: AtomicBool,
    consensus_dropped: AtomicU64,
    decisions_dropped: AtomicU64,
}

impl ChainBridge {
    /// Create a bridge feeding the given stream queues
    pub fn new(
        chain: ChainId,
        consensus_tx: mpsc::Sender<Event>,
        decisions_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            chain,
            consensus_tx,
            decisions_tx,
            detached: AtomicBool::new(false),
            consensus_dropped: AtomicU64::new(0),
            decisions_dropped: AtomicU64::new(0),
        }
    }

    /// Chain this bridge feeds
    #[inline]
    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// Stop accepting events; called first during unpublish
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    /// Whether the bridge still accepts events
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Events dropped on the consensus stream because its queue was full
    pub fn consensus_dropped(&self) -> u64 {
        self.consensus_dropped.load(Ordering::Relaxed)
    }

    /// Events dropped on the decisions stream because its queue was full
    pub fn decisions_dropped(&self) -> u64 {
        self.decisions_dropped.load(Ordering::Relaxed)
    }

    /// Enqueue without blocking; full queue drops the newest event
    fn push(&self, tx: &mpsc::Sender<Event>, dropped: &AtomicU64, event: Event) {
        if self.is_detached() {
            return;
        }
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(chain = %self.chain.short(), total, "queue full, event dropped");
            }
            // Worker gone: the stream halted, the engine keeps going.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl EventSink for ChainBridge {
    fn finalize(&self, container_id: ContainerId, payload: Bytes) {
        self.push(
            &self.consensus_tx,
            &self.consensus_dropped,
            Event::Consensus {
                container_id,
                payload,
            },
        );
    }

    fn decide(&self, container_id: ContainerId, payload: Bytes, status: DecisionStatus) {
        self.push(
            &self.decisions_tx,
            &self.decisions_dropped,
            Event::Decision {
                container_id,
                payload,
                status,
            },
        );
    }
}

#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;
