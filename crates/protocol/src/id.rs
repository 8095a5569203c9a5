//! Identifier types
//!
//! `Id` is the opaque 32-byte value used to address chains and containers.
//! It is the registry key on the publisher side and part of every frame on
//! the wire.

use std::fmt;

use crate::{ProtocolError, Result, ID_LENGTH};

/// Opaque 32-byte identifier
///
/// Displays as lowercase hex. Comparison and hashing are byte-wise, so an
/// `Id` can key a map directly.
///
/// # Example
///
/// ```
/// use chaintap_protocol::Id;
///
/// let id = Id::from_bytes([0xaa; 32]);
/// assert!(id.to_string().starts_with("aaaa"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id([u8; ID_LENGTH]);

/// Identifier of one blockchain instance
pub type ChainId = Id;

/// Identifier of one container (block or transaction)
pub type ContainerId = Id;

impl Id {
    /// Create an ID from a fixed byte array
    #[inline]
    pub const fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create an ID from a slice, which must be exactly [`ID_LENGTH`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; ID_LENGTH] = bytes
            .try_into()
            .map_err(|_| ProtocolError::invalid_id_length(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Get the raw bytes
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Short hex prefix for log fields
    pub fn short(&self) -> String {
        let mut s = String::with_capacity(8);
        for b in &self.0[..4] {
            use fmt::Write;
            let _ = write!(s, "{b:02x}");
        }
        s
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; ID_LENGTH]> for Id {
    fn from(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
