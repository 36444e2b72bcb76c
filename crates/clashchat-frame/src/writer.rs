use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use clashchat_transport::GameStream;

use crate::codec::{encode_frame, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// Each frame is written whole and flushed before `send` returns; under the
/// session's single-writer discipline no interleaving is possible.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.message_id, frame.payload.as_ref())
    }

    /// Encode and send a payload under a message id.
    pub fn send(&mut self, message_id: u16, payload: &[u8]) -> Result<()> {
        if HEADER_SIZE + payload.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: HEADER_SIZE + payload.len(),
                max: self.config.max_frame_size,
            });
        }

        self.buf.clear();
        encode_frame(message_id, payload, &mut self.buf)?;
        self.write_all_buffered()
    }

    /// Write pre-encoded frame bytes verbatim.
    ///
    /// Used for captured packet templates, which are replayed byte-exact
    /// rather than re-encoded.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_all_buffered()
    }

    fn write_all_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<GameStream> {
    /// Create a frame writer for a [`GameStream`] and apply the write timeout
    /// from config.
    pub fn with_config_tcp(inner: GameStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::reader::FrameReader;

    #[test]
    fn send_produces_readable_frame() {
        let mut sink = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut sink);
            writer.send(0x0232, b"login").unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(sink));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.message_id, 0x0232);
        assert_eq!(frame.payload.as_ref(), b"login");
    }

    #[test]
    fn send_rejects_oversized_payload() {
        let cfg = FrameConfig {
            max_frame_size: 16,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Vec::new(), cfg);
        let err = writer.send(1, &[0u8; 64]).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 68, max: 16 }));
    }

    #[test]
    fn send_raw_writes_bytes_verbatim() {
        let mut sink = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut sink);
            writer.send_raw(&[0x08, 0x00, 0x32, 0x02, 0xDE, 0xAD, 0xBE, 0xEF]) // captured image
                .unwrap();
        }
        assert_eq!(sink, vec![0x08, 0x00, 0x32, 0x02, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn short_writes_are_completed() {
        struct TwoByteSink {
            written: Vec<u8>,
        }
        impl Write for TwoByteSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                let n = buf.len().min(2);
                self.written.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(TwoByteSink { written: Vec::new() });
        writer.send(5, b"chunked-write").unwrap();

        let sink = writer.into_inner();
        let mut reader = FrameReader::new(Cursor::new(sink.written));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.message_id, 5);
        assert_eq!(frame.payload.as_ref(), b"chunked-write");
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        struct ClosedSink;
        impl Write for ClosedSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(ClosedSink);
        let err = writer.send(1, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
