//! Chaintap Protocol - core types for chain event streams
//!
//! This crate provides the types that flow from a node's consensus engine to
//! external subscribers:
//! - `Id` - opaque 32-byte identifier (`ChainId` / `ContainerId` aliases)
//! - `Event` - a finalized container or a decided transaction
//! - `DecisionStatus` - outcome carried on the decisions stream
//! - `FrameDecoder` - incremental parser for the subscriber side
//!
//! # Wire Format
//!
//! Every event is one self-delimiting frame:
//!
//! ```text
//! ┌────────┬──────────────┬──────────────┬─────────┬───────────────────┐
//! │ 1 byte │ uvarint      │ 32 bytes     │ N bytes │ 1 byte            │
//! │ kind   │ body length  │ container id │ payload │ status (decision) │
//! └────────┴──────────────┴──────────────┴─────────┴───────────────────┘
//! ```
//!
//! The kind byte doubles as the version tag: a format revision allocates a new
//! kind value, and subscribers skip kinds they do not recognize using the
//! declared body length. Existing framing never breaks.
//!
//! # Design Principles
//!
//! - **Zero-copy**: payloads ride in `bytes::Bytes` from the engine hook to
//!   the socket write, and back out of the decoder
//! - **Deterministic**: encoding a given event always yields the same bytes
//! - **Engine-safe**: encoding is infallible; all fallibility lives on the
//!   decode side

mod error;
mod event;
mod id;
mod wire;

pub use error::ProtocolError;
pub use event::{DecisionStatus, Event, EventKind, StreamKind};
pub use id::{ChainId, ContainerId, Id};
pub use wire::{encode_event, Frame, FrameDecoder};

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Identifier length in bytes
pub const ID_LENGTH: usize = 32;

/// Upper bound on a frame body; decoders reject larger declared lengths
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

// Test modules - only compiled during testing
#[cfg(test)]
mod event_test;
