//! Event model
//!
//! An [`Event`] is one occurrence on a chain's emission path: a container
//! finalized by consensus, or a transaction decided one way or the other.
//! Events are transient - the publisher encodes and forgets them.

use bytes::Bytes;

use crate::{ContainerId, ProtocolError, Result};

/// Wire discriminant for each event kind
///
/// The kind byte is the wire format's version tag: a revision of an event's
/// encoding allocates a new kind value instead of changing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Container finalized by consensus
    Consensus = 0x01,
    /// Transaction decided (accepted or rejected)
    Decision = 0x02,
}

impl EventKind {
    /// Wire value of this kind
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value; `None` for kinds this version does not know
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Consensus),
            0x02 => Some(Self::Decision),
            _ => None,
        }
    }
}

/// Outcome of a decided transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DecisionStatus {
    /// Transaction was accepted
    Accepted = 0x00,
    /// Transaction was rejected
    Rejected = 0x01,
}

impl DecisionStatus {
    /// Wire value of this status
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Accepted),
            0x01 => Ok(Self::Rejected),
            other => Err(ProtocolError::InvalidStatus(other)),
        }
    }
}

/// The two outbound streams of a published chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Finalized containers
    Consensus,
    /// Decided transactions
    Decisions,
}

impl StreamKind {
    /// Stable name used in endpoint paths and log fields
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consensus => "consensus",
            Self::Decisions => "decisions",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence on a chain's emission path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Container finalized by consensus
    Consensus {
        /// Identifier of the finalized container
        container_id: ContainerId,
        /// Raw container bytes, untouched
        payload: Bytes,
    },
    /// Transaction decided
    Decision {
        /// Identifier of the decided transaction
        container_id: ContainerId,
        /// Raw transaction bytes, untouched
        payload: Bytes,
        /// Accepted or rejected
        status: DecisionStatus,
    },
}

impl Event {
    /// Wire kind of this event
    #[inline]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Consensus { .. } => EventKind::Consensus,
            Self::Decision { .. } => EventKind::Decision,
        }
    }

    /// Container identifier carried by this event
    #[inline]
    pub const fn container_id(&self) -> &ContainerId {
        match self {
            Self::Consensus { container_id, .. } | Self::Decision { container_id, .. } => {
                container_id
            }
        }
    }

    /// Payload bytes carried by this event
    #[inline]
    pub const fn payload(&self) -> &Bytes {
        match self {
            Self::Consensus { payload, .. } | Self::Decision { payload, .. } => payload,
        }
    }

    /// Decision status, if this is a decision event
    #[inline]
    pub const fn status(&self) -> Option<DecisionStatus> {
        match self {
            Self::Consensus { .. } => None,
            Self::Decision { status, .. } => Some(*status),
        }
    }
}
