//! Chaintap IPC - per-chain event publishing over Unix sockets (Unix only)
//!
//! This crate turns a node's internal consensus and decision events into live
//! streams that external processes subscribe to over Unix-domain sockets. Each
//! published chain gets a pair of endpoints - one for finalized containers,
//! one for decided transactions - and the engine never blocks on a slow or
//! absent subscriber.
//!
//! **Note:** This crate only compiles on Unix platforms (Linux, macOS) as it
//! uses Unix domain sockets for IPC.
//!
//! # Architecture
//!
//! ```text
//! engine finalize/decide
//!     │
//!     ▼
//! HookSet ──► ChainBridge (try_send, never blocks)
//!                 │                │
//!          [consensus queue] [decisions queue]
//!                 │                │
//!            drain worker     drain worker
//!                 │                │
//!             PubSocket        PubSocket
//!                 │                │
//!             subscribers      subscribers
//!
//! control: caller ──► ChainRegistry::publish / unpublish
//! ```
//!
//! Per-stream ordering is FIFO; nothing is ordered across streams or chains.
//! A full queue drops the newest event and bumps a counter - engine liveness
//! never depends on subscriber behavior.

#[cfg(unix)]
mod bridge;
#[cfg(unix)]
mod config;
#[cfg(unix)]
mod endpoint;
#[cfg(unix)]
mod error;
#[cfg(unix)]
mod hooks;
#[cfg(unix)]
mod publisher;
#[cfg(unix)]
mod registry;
#[cfg(unix)]
mod socket;

#[cfg(unix)]
pub use bridge::{ChainBridge, EventSink};
#[cfg(unix)]
pub use config::IpcConfig;
#[cfg(unix)]
pub use endpoint::{Endpoint, EndpointAllocator};
#[cfg(unix)]
pub use error::IpcError;
#[cfg(unix)]
pub use hooks::{ChainAliases, ChainLookup, HookRegistrar, HookSet};
#[cfg(unix)]
pub use publisher::{Publisher, PublisherStats};
#[cfg(unix)]
pub use registry::{ChainRegistry, PublishedUrls};
#[cfg(unix)]
pub use socket::PubSocket;

/// Result type for IPC operations
#[cfg(unix)]
pub type Result<T> = std::result::Result<T, IpcError>;
