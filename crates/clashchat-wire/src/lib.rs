//! Schema-driven decoding of game-server payloads.
//!
//! The wire layout is reverse-engineered from a single capture session and
//! varies across game client releases, so nothing here hardcodes an offset:
//! every field is read through a [`FieldSpec`] supplied by configuration, and
//! every span access is bounds-checked. Unknown message ids are not errors;
//! they decode to [`Decoded::Unrecognized`] and the session skips them.

pub mod decode;
pub mod error;
pub mod fields;
pub mod schema;

pub use decode::{decode_chat, ChatEvent, Decoded, FrameDecoder};
pub use error::{Result, WireError};
pub use fields::FieldValue;
pub use schema::{ChatSchema, FieldKind, FieldSpec, ReplySchema, WireSchema};
