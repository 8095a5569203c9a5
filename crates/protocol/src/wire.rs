//! Frame codec for event streams
//!
//! Encodes events into self-delimiting frames and decodes them back on the
//! subscriber side. The decoder is incremental: feed it whatever the socket
//! produced and pull complete frames out as they become available.
//!
//! # Forward compatibility
//!
//! A frame's body length covers everything after the length field, so a
//! subscriber that meets a kind byte it does not recognize skips the whole
//! body and stays in sync. Unknown kinds surface as [`Frame::Unknown`] rather
//! than an error.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    DecisionStatus, Event, EventKind, ProtocolError, Result, ID_LENGTH, MAX_FRAME_SIZE,
};

/// Maximum encoded width of a uvarint
const MAX_VARINT_LEN: usize = 10;

/// Encode one event into a wire frame
///
/// Deterministic and infallible: the same event always produces the same
/// bytes.
pub fn encode_event(event: &Event) -> Bytes {
    let payload = event.payload();
    let body_len = ID_LENGTH + payload.len() + usize::from(event.status().is_some());

    let mut buf = BytesMut::with_capacity(1 + MAX_VARINT_LEN + body_len);
    buf.put_u8(event.kind().to_u8());
    put_uvarint(&mut buf, body_len as u64);
    buf.put_slice(event.container_id().as_bytes());
    buf.put_slice(payload);
    if let Some(status) = event.status() {
        buf.put_u8(status.to_u8());
    }
    buf.freeze()
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A frame of a kind this version understands
    Event(Event),
    /// A well-framed event of an unrecognized kind, skipped by length
    Unknown {
        /// The unrecognized kind byte
        kind: u8,
    },
}

/// Incremental frame decoder
///
/// # Example
///
/// ```
/// use chaintap_protocol::{encode_event, Event, FrameDecoder, Frame, Id};
/// use bytes::Bytes;
///
/// let event = Event::Consensus {
///     container_id: Id::from_bytes([0xaa; 32]),
///     payload: Bytes::from_static(&[1, 2, 3]),
/// };
///
/// let mut decoder = FrameDecoder::new();
/// decoder.push(&encode_event(&event));
/// assert_eq!(decoder.next().unwrap(), Some(Frame::Event(event)));
/// assert_eq!(decoder.next().unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes read off the socket
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes currently buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pull the next complete frame, if one is buffered
    ///
    /// Returns `Ok(None)` when more input is needed. Errors are fatal to the
    /// stream: after a decode error the buffer contents are unreliable.
    pub fn next(&mut self) -> Result<Option<Frame>> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        let kind = self.buf[0];
        let (body_len, varint_len) = match peek_uvarint(&self.buf[1..])? {
            Some(parsed) => parsed,
            None => return Ok(None),
        };
        if body_len as usize > MAX_FRAME_SIZE {
            return Err(ProtocolError::too_large(body_len as usize));
        }

        let frame_len = 1 + varint_len + body_len as usize;
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(frame_len);
        let body = frame.split_off(1 + varint_len).freeze();
        decode_body(kind, body).map(Some)
    }
}

/// Decode a frame body given its kind byte
fn decode_body(kind: u8, mut body: Bytes) -> Result<Frame> {
    let Some(kind) = EventKind::from_u8(kind) else {
        return Ok(Frame::Unknown { kind });
    };

    match kind {
        EventKind::Consensus => {
            if body.len() < ID_LENGTH {
                return Err(ProtocolError::too_short(ID_LENGTH, body.len()));
            }
            let container_id = crate::Id::from_slice(&body.split_to(ID_LENGTH))?;
            Ok(Frame::Event(Event::Consensus {
                container_id,
                payload: body,
            }))
        }
        EventKind::Decision => {
            if body.len() < ID_LENGTH + 1 {
                return Err(ProtocolError::too_short(ID_LENGTH + 1, body.len()));
            }
            let container_id = crate::Id::from_slice(&body.split_to(ID_LENGTH))?;
            // Status rides as the trailing byte, after the payload.
            let status = DecisionStatus::from_u8(body[body.len() - 1])?;
            let payload = body.split_to(body.len() - 1);
            Ok(Frame::Event(Event::Decision {
                container_id,
                payload,
                status,
            }))
        }
    }
}

// ============================================================================
// Varint helpers (unsigned LEB128)
// ============================================================================

/// Append `value` as an unsigned LEB128 varint
pub(crate) fn put_uvarint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Parse a uvarint from the front of `buf` without consuming it
///
/// Returns `Ok(None)` if the varint is incomplete, or the value and its
/// encoded width.
pub(crate) fn peek_uvarint(buf: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(ProtocolError::VarintOverflow);
        }
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    Ok(None)
}
