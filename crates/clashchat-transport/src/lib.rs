//! TCP transport for the clashchat protocol client.
//!
//! Provides [`GameStream`], a thin wrapper around a connected TCP socket with
//! timeout control, and the [`Dial`] trait that abstracts how a session
//! obtains its byte stream: the real [`TcpDialer`] in production, scripted
//! fakes in tests.

mod error;
mod tcp;
mod traits;

pub use error::{Result, TransportError};
pub use tcp::{GameStream, TcpDialer};
pub use traits::Dial;
