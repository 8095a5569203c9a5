//! Protocol error types
//!
//! Errors that can occur when decoding event frames. Encoding is infallible.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame body is shorter than its fixed fields require
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// Declared body length exceeds the maximum frame size
    #[error("frame too large: declared {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Identifier field has the wrong length
    #[error("invalid id length: expected {expected} bytes, got {actual}")]
    InvalidIdLength { expected: usize, actual: usize },

    /// Unknown decision status value
    #[error("invalid decision status: {0:#04x}")]
    InvalidStatus(u8),

    /// Varint ran past its maximum width
    #[error("varint overflow")]
    VarintOverflow,
}

impl ProtocolError {
    /// Create a frame too short error
    #[inline]
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::FrameTooShort { expected, actual }
    }

    /// Create an invalid id length error
    #[inline]
    pub fn invalid_id_length(actual: usize) -> Self {
        Self::InvalidIdLength {
            expected: crate::ID_LENGTH,
            actual,
        }
    }

    /// Create a frame too large error
    #[inline]
    pub fn too_large(size: usize) -> Self {
        Self::FrameTooLarge {
            size,
            max: crate::MAX_FRAME_SIZE,
        }
    }
}
