//! Session management for the clashchat protocol client.
//!
//! Owns the fragile end of the protocol: replaying a captured,
//! credential-patched login packet ([`HandshakeTemplate`]), classifying the
//! server's reply, and keeping a long-lived decode loop alive across
//! transport failures with bounded, jittered reconnection.

pub mod backoff;
pub mod credentials;
pub mod error;
pub mod handshake;
pub mod session;
pub mod shutdown;
pub mod template;

mod serde_hex;

pub use backoff::BackoffConfig;
pub use credentials::Credentials;
pub use error::SessionError;
pub use handshake::{perform, HandshakeError};
pub use session::{
    Dispatch, DispatchRejected, KeepaliveConfig, Session, SessionConfig, SessionState, StateWatch,
    StatusEvent,
};
pub use shutdown::ShutdownHandle;
pub use template::{HandshakeTemplate, Region, TemplateError};
