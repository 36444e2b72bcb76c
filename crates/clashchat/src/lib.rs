//! Broadcast-chat client for a captured game protocol session.
//!
//! clashchat attaches to a mobile game's proprietary login/chat server,
//! authenticates by replaying a captured, credential-patched login packet,
//! and decodes the broadcast chat stream for display.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP stream and dial abstraction
//! - [`frame`] — Length-prefixed binary frame codec
//! - [`wire`] — Schema-driven payload decoding
//! - [`session`] — Handshake and reconnecting session loop

/// Re-export transport types.
pub mod transport {
    pub use clashchat_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use clashchat_frame::*;
}

/// Re-export wire types.
pub mod wire {
    pub use clashchat_wire::*;
}

/// Re-export session types.
pub mod session {
    pub use clashchat_session::*;
}
