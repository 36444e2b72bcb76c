use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use clashchat_transport::GameStream;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// A clean EOF between frames is [`FrameError::ConnectionClosed`]; an EOF
/// with a partial frame still buffered is [`FrameError::Truncated`], so the
/// session loop can tell a server hangup apart from a torn stream.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Timeout errors (`WouldBlock`/`TimedOut`) from the underlying stream
    /// propagate as [`FrameError::Io`]; buffered partial bytes survive the
    /// error, so the caller may poll a shutdown flag and call `read_frame`
    /// again without losing framing.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_frame_size)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Err(FrameError::ConnectionClosed);
                }
                return Err(FrameError::Truncated {
                    buffered: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Whether a partially received frame is currently buffered.
    pub fn has_partial_frame(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<GameStream> {
    /// Create a frame reader for a [`GameStream`] and apply the read timeout
    /// from config.
    pub fn with_config_tcp(inner: GameStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: clashchat_transport::TransportError) -> FrameError {
    match err {
        clashchat_transport::TransportError::Io(io) => FrameError::Io(io),
        clashchat_transport::TransportError::Resolve { source, .. }
        | clashchat_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_MAX_FRAME, HEADER_SIZE};

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_frame(0x03f6, b"hello", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.message_id, 0x03f6);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn complete_frames_then_partial_tail() {
        // Three complete frames followed by a partial fourth: the reader
        // must yield exactly three and never surface the partial one.
        let mut wire = BytesMut::new();
        encode_frame(1, b"one", &mut wire).unwrap();
        encode_frame(2, b"two", &mut wire).unwrap();
        encode_frame(3, b"three", &mut wire).unwrap();
        let mut partial = BytesMut::new();
        encode_frame(4, b"never-finished", &mut partial).unwrap();
        wire.extend_from_slice(&partial[..HEADER_SIZE + 3]);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        for (id, body) in [(1u16, b"one".as_ref()), (2, b"two"), (3, b"three")] {
            let frame = reader.read_frame().unwrap();
            assert_eq!(frame.message_id, id);
            assert_eq!(frame.payload.as_ref(), body);
        }

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { buffered } if buffered == HEADER_SIZE + 3));
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_frame(4, b"slow", &mut wire).unwrap();

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.message_id, 4);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn clean_close_between_frames() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn close_mid_frame_is_truncated() {
        let mut partial = BytesMut::new();
        partial.put_u16_le(20);
        partial.put_u16_le(2);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { buffered: 13 }));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_u16_le(2048);
        wire.put_u16_le(1);

        let cfg = FrameConfig {
            max_frame_size: 64,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 2048, max: 64 }));
    }

    #[test]
    fn timeout_error_preserves_buffered_bytes() {
        let mut wire = BytesMut::new();
        encode_frame(7, b"resume-me", &mut wire).unwrap();
        let split = wire.len() - 3;

        let reader = TimeoutMidway {
            bytes: wire.to_vec(),
            pos: 0,
            stall_at: split,
            stalled: false,
        };
        let mut framed = FrameReader::new(reader);

        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
        assert!(framed.has_partial_frame());

        // A later call picks up where the stream left off.
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.message_id, 7);
        assert_eq!(frame.payload.as_ref(), b"resume-me");
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_frame(8, b"ok", &mut wire).unwrap();

        let reader = InterruptedThenData {
            state: 0,
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.message_id, 8);
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn roundtrip_through_writer() {
        let mut sink = Vec::new();
        let mut writer = crate::writer::FrameWriter::new(&mut sink);
        writer.send(0x042c, b"poll").unwrap();

        let mut reader = FrameReader::new(Cursor::new(sink));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.message_id, 0x042c);
        assert_eq!(frame.payload.as_ref(), b"poll");
    }

    #[test]
    fn roundtrip_arbitrary_payload_lengths() {
        for len in [0usize, 1, 3, 184, 1024, DEFAULT_MAX_FRAME - HEADER_SIZE] {
            let payload = vec![0x5A; len];
            let mut wire = BytesMut::new();
            encode_frame(9, &payload, &mut wire).unwrap();

            let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
            let frame = reader.read_frame().unwrap();
            assert_eq!(frame.payload.len(), len);
            assert_eq!(frame.payload.as_ref(), payload.as_slice());
        }
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct TimeoutMidway {
        bytes: Vec<u8>,
        pos: usize,
        stall_at: usize,
        stalled: bool,
    }

    impl Read for TimeoutMidway {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos == self.stall_at && !self.stalled {
                self.stalled = true;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            let limit = if self.stalled {
                self.bytes.len()
            } else {
                self.stall_at
            };
            if self.pos >= limit {
                return Ok(0);
            }
            let n = (limit - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
