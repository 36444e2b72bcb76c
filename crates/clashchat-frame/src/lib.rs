//! Length-prefixed binary framing for the game's wire protocol.
//!
//! Every frame starts with a 4-byte header: a little-endian `u16` total size
//! (header included) followed by a little-endian `u16` message id. The codec
//! knows nothing about payload semantics; that is the wire crate's job.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_FRAME, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
