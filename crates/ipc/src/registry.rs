//! Chain registry
//!
//! `ChainRegistry` maps each chain identifier to at most one live
//! [`Publisher`] and coordinates atomic setup and teardown across a chain's
//! socket pair and engine hook.
//!
//! # Locking
//!
//! Two levels. The outer `parking_lot::Mutex` guards the chain → slot map and
//! is only held to fetch or create a slot, never across an `.await`. Each
//! slot's `tokio::sync::Mutex` serializes publish/unpublish for that chain,
//! so operations on distinct chains proceed fully in parallel while N
//! concurrent publishes of the same chain resolve to exactly one winner.
//!
//! Unpublish holds the slot lock through the whole teardown, so a publish
//! issued right after it returns can never race a straggling worker. Once
//! teardown completes the map entry is released, unless a racing publish
//! already holds the slot.

use std::collections::HashMap;
use std::sync::Arc;

use chaintap_protocol::ChainId;
use parking_lot::Mutex;
use tracing::info;

use crate::config::IpcConfig;
use crate::endpoint::EndpointAllocator;
use crate::hooks::HookRegistrar;
use crate::publisher::{Publisher, PublisherStats};
use crate::{IpcError, Result};

/// One chain's publisher slot; `None` between publications
type Slot = Arc<tokio::sync::Mutex<Option<Publisher>>>;

/// Endpoint URLs returned by a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedUrls {
    /// Where finalized containers stream
    pub consensus_url: String,
    /// Where decided transactions stream
    pub decisions_url: String,
}

/// Registry of live publishers, keyed by chain
pub struct ChainRegistry {
    cfg: IpcConfig,
    allocator: EndpointAllocator,
    hooks: Arc<dyn HookRegistrar>,
    chains: Mutex<HashMap<ChainId, Slot>>,
}

impl ChainRegistry {
    /// Create a registry that installs hooks through `hooks`
    pub fn new(cfg: IpcConfig, hooks: Arc<dyn HookRegistrar>) -> Self {
        let allocator = EndpointAllocator::new(&cfg.base_dir);
        Self {
            cfg,
            allocator,
            hooks,
            chains: Mutex::new(HashMap::new()),
        }
    }

    /// Start publishing a chain's events
    ///
    /// Binds both sockets, installs the engine hook, and returns the endpoint
    /// URLs. Fails with [`IpcError::AlreadyPublishing`] if the chain has a
    /// live publisher - there is no silent replace. A bind failure rolls back
    /// completely and leaves no registry entry.
    pub async fn publish(&self, chain: ChainId) -> Result<PublishedUrls> {
        let slot = self.slot(chain);
        let mut guard = slot.lock().await;
        if guard.is_some() {
            return Err(IpcError::AlreadyPublishing { chain });
        }

        let publisher = Publisher::open(chain, &self.cfg, &self.allocator).await?;
        let urls = PublishedUrls {
            consensus_url: publisher.consensus_url(),
            decisions_url: publisher.decisions_url(),
        };

        self.hooks.install(chain, publisher.sink());
        *guard = Some(publisher);

        info!(chain = %chain, consensus = %urls.consensus_url,
            decisions = %urls.decisions_url, "chain published");
        Ok(urls)
    }

    /// Stop publishing a chain's events
    ///
    /// Removes the engine hook, stops both drain workers, closes both sockets
    /// and releases the endpoints. Synchronous in effect: returns only after
    /// teardown completes. Fails with [`IpcError::NotPublishing`] if the
    /// chain has no live publisher.
    pub async fn unpublish(&self, chain: ChainId) -> Result<()> {
        let slot = self
            .lookup_slot(&chain)
            .ok_or(IpcError::NotPublishing { chain })?;

        let mut guard = slot.lock().await;
        let publisher = guard.take().ok_or(IpcError::NotPublishing { chain })?;

        // Hook first: nothing may be enqueued once teardown has begun.
        self.hooks.remove(&chain);
        publisher.shutdown(&self.cfg).await;

        // Drop the map entry unless a racing publish already holds a clone of
        // the slot; that publish must stay visible through this entry.
        {
            let mut chains = self.chains.lock();
            if let Some(existing) = chains.get(&chain) {
                if Arc::ptr_eq(existing, &slot) && Arc::strong_count(existing) == 2 {
                    chains.remove(&chain);
                }
            }
        }

        info!(chain = %chain, "chain unpublished");
        Ok(())
    }

    /// Whether the chain currently has a live publisher
    pub async fn is_publishing(&self, chain: &ChainId) -> bool {
        match self.lookup_slot(chain) {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Chains with a live publisher, sorted
    pub async fn active_chains(&self) -> Vec<ChainId> {
        let slots: Vec<(ChainId, Slot)> = {
            let chains = self.chains.lock();
            chains.iter().map(|(c, s)| (*c, Arc::clone(s))).collect()
        };

        let mut active = Vec::new();
        for (chain, slot) in slots {
            if slot.lock().await.is_some() {
                active.push(chain);
            }
        }
        active.sort_unstable();
        active
    }

    /// Counters for a chain's live publisher
    pub async fn stats(&self, chain: &ChainId) -> Result<PublisherStats> {
        let slot = self
            .lookup_slot(chain)
            .ok_or(IpcError::NotPublishing { chain: *chain })?;
        let guard = slot.lock().await;
        match guard.as_ref() {
            Some(publisher) => Ok(publisher.stats().await),
            None => Err(IpcError::NotPublishing { chain: *chain }),
        }
    }

    /// Unpublish every live chain; process teardown
    pub async fn shutdown_all(&self) {
        for chain in self.active_chains().await {
            // A concurrent unpublish winning the race is fine.
            let _ = self.unpublish(chain).await;
        }
    }

    /// Fetch or create the chain's slot
    fn slot(&self, chain: ChainId) -> Slot {
        let mut chains = self.chains.lock();
        Arc::clone(chains.entry(chain).or_default())
    }

    /// Fetch the chain's slot, if present
    fn lookup_slot(&self, chain: &ChainId) -> Option<Slot> {
        self.chains.lock().get(chain).map(Arc::clone)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
