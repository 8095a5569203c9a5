//! Error types for the IPC crate

use std::io;
use std::path::PathBuf;

use chaintap_protocol::ChainId;
use thiserror::Error;

/// Errors that can occur in the IPC publishing system
#[derive(Error, Debug)]
pub enum IpcError {
    /// Chain name did not resolve to an identifier
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// Chain already has an active publisher; unpublish it first
    #[error("chain {chain} is already publishing")]
    AlreadyPublishing { chain: ChainId },

    /// Chain has no active publisher
    #[error("chain {chain} is not publishing")]
    NotPublishing { chain: ChainId },

    /// Another live process is bound at the endpoint path
    #[error("address in use: {path}")]
    AddressInUse { path: PathBuf },

    /// Socket bind failed for a reason other than a live collision
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Unexpected internal failure; the chain's stream stops, the node does not
    #[error("internal error: {0}")]
    Internal(String),
}

impl IpcError {
    /// Create a bind error, mapping a live-collision kind to `AddressInUse`
    pub fn bind(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            Self::AddressInUse { path }
        } else {
            Self::Bind { path, source }
        }
    }

    /// Short stable label for log fields
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::UnknownChain(_) => "unknown_chain",
            Self::AlreadyPublishing { .. } => "already_publishing",
            Self::NotPublishing { .. } => "not_publishing",
            Self::AddressInUse { .. } => "address_in_use",
            Self::Bind { .. } => "bind_failure",
            Self::Internal(_) => "internal",
        }
    }
}
