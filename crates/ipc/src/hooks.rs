//! Engine-facing hook surfaces
//!
//! Two narrow traits decouple this subsystem from node internals:
//!
//! - [`ChainLookup`] resolves a human-readable chain name to a [`ChainId`];
//!   the remote-call layer uses it before touching the registry.
//! - [`HookRegistrar`] is where the registry installs and removes a chain's
//!   [`EventSink`] at publish/unpublish time.
//!
//! [`HookSet`] is the in-memory implementation a node embeds: the engine
//! calls its `finalize`/`decide` dispatchers on the emission path, and those
//! contain any sink panic so a defective publication can never interrupt
//! consensus processing.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use chaintap_protocol::{ChainId, ContainerId, DecisionStatus};
use parking_lot::RwLock;
use tracing::warn;

use crate::bridge::EventSink;
use crate::{IpcError, Result};

/// Resolves chain names to identifiers
pub trait ChainLookup: Send + Sync {
    /// Resolve `name`, or [`IpcError::UnknownChain`]
    fn lookup(&self, name: &str) -> Result<ChainId>;
}

/// Engine surface for installing and removing event hooks
pub trait HookRegistrar: Send + Sync {
    /// Install `sink` on the chain's finalize/decide paths
    fn install(&self, chain: ChainId, sink: Arc<dyn EventSink>);

    /// Remove the chain's hook; a missing hook is a no-op
    fn remove(&self, chain: &ChainId);
}

/// Table-backed name resolution
#[derive(Debug, Default)]
pub struct ChainAliases {
    aliases: RwLock<HashMap<String, ChainId>>,
}

impl ChainAliases {
    /// Create an empty alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias for a chain
    pub fn register(&self, name: impl Into<String>, chain: ChainId) {
        self.aliases.write().insert(name.into(), chain);
    }
}

impl ChainLookup for ChainAliases {
    fn lookup(&self, name: &str) -> Result<ChainId> {
        self.aliases
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| IpcError::UnknownChain(name.to_string()))
    }
}

/// In-memory hook registrar with panic-contained dispatch
#[derive(Default)]
pub struct HookSet {
    sinks: RwLock<HashMap<ChainId, Arc<dyn EventSink>>>,
}

impl HookSet {
    /// Create an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installed hooks
    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    /// Whether any hook is installed
    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Dispatch a finalized container to the chain's sink, if installed
    ///
    /// Called inline on the engine's finalize path. Bounded time: the sink is
    /// enqueue-only and a panic inside it is caught here.
    pub fn finalize(&self, chain: &ChainId, container_id: ContainerId, payload: Bytes) {
        if let Some(sink) = self.sink_for(chain) {
            let run = AssertUnwindSafe(|| sink.finalize(container_id, payload));
            if catch_unwind(run).is_err() {
                warn!(chain = %chain.short(), "event sink panicked on finalize");
            }
        }
    }

    /// Dispatch a decided transaction to the chain's sink, if installed
    pub fn decide(
        &self,
        chain: &ChainId,
        container_id: ContainerId,
        payload: Bytes,
        status: DecisionStatus,
    ) {
        if let Some(sink) = self.sink_for(chain) {
            let run = AssertUnwindSafe(|| sink.decide(container_id, payload, status));
            if catch_unwind(run).is_err() {
                warn!(chain = %chain.short(), "event sink panicked on decide");
            }
        }
    }

    /// Clone the sink handle out so dispatch never holds the lock
    fn sink_for(&self, chain: &ChainId) -> Option<Arc<dyn EventSink>> {
        self.sinks.read().get(chain).cloned()
    }
}

impl HookRegistrar for HookSet {
    fn install(&self, chain: ChainId, sink: Arc<dyn EventSink>) {
        self.sinks.write().insert(chain, sink);
    }

    fn remove(&self, chain: &ChainId) {
        self.sinks.write().remove(chain);
    }
}

#[cfg(test)]
#[path = "hooks_test.rs"]
mod tests;
