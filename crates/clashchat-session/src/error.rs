use crate::template::TemplateError;

/// Fatal session outcomes surfaced to the caller.
///
/// Transport failures are not here: while the session is live they route
/// through reconnection, and only the retry ceiling converts them into
/// [`SessionError::Abandoned`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server refused the handshake. The credentials are presumed
    /// invalid (expired access key, stale capture) and never auto-retried.
    #[error("server rejected handshake (reason {reason}); credentials presumed invalid")]
    HandshakeRejected { reason: u32 },

    /// The reconnect ceiling was exceeded.
    #[error("session abandoned after {attempts} reconnect attempts")]
    Abandoned { attempts: u32 },

    /// The handshake template cannot be patched with these credentials.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
