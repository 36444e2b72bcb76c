use std::io::{Read, Write};

use crate::error::Result;

/// Capability to open a byte stream to the game server.
///
/// The session loop redials through this trait on every connection attempt,
/// so a session is a plain value with no hidden socket state: production code
/// hands it a [`crate::TcpDialer`], tests hand it a fake that replays
/// scripted bytes.
pub trait Dial {
    /// The stream type produced by this dialer.
    type Stream: Read + Write + Send + 'static;

    /// Open a fresh connection (blocking).
    fn dial(&mut self) -> Result<Self::Stream>;

    /// Clone the stream handle, so framed reads and framed writes can each
    /// own one end of the same connection.
    fn clone_stream(&self, stream: &Self::Stream) -> Result<Self::Stream>;

    /// Apply a read timeout to an open stream.
    ///
    /// Dialers whose streams cannot time out (in-memory fakes) may ignore
    /// this; the real TCP dialer forwards it to the socket so a blocked read
    /// wakes periodically.
    fn set_read_timeout(
        &self,
        stream: &mut Self::Stream,
        timeout: Option<std::time::Duration>,
    ) -> Result<()> {
        let _ = (stream, timeout);
        Ok(())
    }
}
