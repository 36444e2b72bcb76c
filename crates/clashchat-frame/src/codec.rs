use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: size (2) + message id (2) = 4 bytes.
///
/// The size field counts the whole frame, header included.
pub const HEADER_SIZE: usize = 4;

/// Default maximum frame size: 32 KiB.
///
/// The observed protocol never exceeds a few KiB per frame; the header's u16
/// size field caps the hard limit at 64 KiB regardless.
pub const DEFAULT_MAX_FRAME: usize = 32 * 1024;

/// One length-delimited unit of the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message id discriminator from the frame header.
    pub message_id: u16,
    /// The frame payload (everything after the header).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(message_id: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────┬──────────────────────┐
/// │ Size       │ Message id   │ Payload              │
/// │ (2B LE)    │ (2B LE)      │ (Size - 4 bytes)     │
/// └────────────┴──────────────┴──────────────────────┘
/// ```
pub fn encode_frame(message_id: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let total = HEADER_SIZE + payload.len();
    if total > u16::MAX as usize {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: u16::MAX as usize,
        });
    }
    dst.reserve(total);
    dst.put_u16_le(total as u16);
    dst.put_u16_le(message_id);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. The size bound is
/// checked from the header alone, before any payload accumulates.
pub fn decode_frame(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let size = u16::from_le_bytes([src[0], src[1]]) as usize;
    let message_id = u16::from_le_bytes([src[2], src[3]]);

    if size < HEADER_SIZE {
        return Err(FrameError::InvalidLength { size });
    }
    if size > max_frame {
        return Err(FrameError::FrameTooLarge {
            size,
            max: max_frame,
        });
    }

    if src.len() < size {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(size - HEADER_SIZE).freeze();

    Ok(Some(Frame {
        message_id,
        payload,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum total frame size in bytes. Default: 32 KiB.
    pub max_frame_size: usize,
    /// Read timeout applied to the underlying stream.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout applied to the underlying stream.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
