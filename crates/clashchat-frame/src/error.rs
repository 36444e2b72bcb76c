/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared frame size exceeds the configured maximum.
    ///
    /// The wire format is reverse-engineered and the server is not trusted;
    /// this bound stops a hostile or corrupt length header from pinning
    /// unbounded memory.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The declared frame size is smaller than the frame header itself.
    #[error("invalid frame size {size} (smaller than the 4-byte header)")]
    InvalidLength { size: usize },

    /// The connection closed with a partially received frame still buffered.
    #[error("connection closed mid-frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    /// The connection closed cleanly between frames.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
