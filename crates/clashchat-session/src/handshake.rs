use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use clashchat_frame::{Frame, FrameError, FrameReader, FrameWriter};
use clashchat_wire::ReplySchema;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::template::{HandshakeTemplate, TemplateError};

/// Errors that can occur while performing the handshake.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The server actively refused the login, commonly an expired access
    /// key or a stale capture. Terminal for these credentials.
    #[error("server rejected handshake (reason {reason})")]
    Rejected { reason: u32 },

    /// The reply matched no known accept or reject signature. Continuing
    /// would risk desynchronizing the stream, so the attempt is aborted.
    #[error("unexpected handshake reply: message id {message_id:#06x} ({len}-byte payload)")]
    Unexpected { message_id: u16, len: usize },

    /// No reply arrived within the handshake timeout.
    #[error("no handshake reply within {0:?}")]
    Timeout(Duration),

    /// Template patching failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Frame-level failure while exchanging the handshake.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Perform the login handshake on a fresh connection.
///
/// Writes the credential-patched capture verbatim (the template is a complete
/// frame image, replayed byte-exact), then reads the server's reply and
/// classifies it against the schema's signatures. The handshake is strictly
/// sequential: no chat frame is processed until acceptance is observed.
pub fn perform<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    template: &HandshakeTemplate,
    creds: &Credentials,
    reply: &ReplySchema,
    timeout: Duration,
) -> Result<(), HandshakeError> {
    let patched = template.patch(creds)?;
    writer.send_raw(&patched)?;
    debug!(template_len = patched.len(), "login packet sent");

    let frame = recv_reply(reader, timeout)?;
    classify(&frame, reply)
}

fn recv_reply<R: Read>(
    reader: &mut FrameReader<R>,
    timeout: Duration,
) -> Result<Frame, HandshakeError> {
    let deadline = Instant::now() + timeout;
    loop {
        match reader.read_frame() {
            Ok(frame) => return Ok(frame),
            Err(FrameError::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                if Instant::now() >= deadline {
                    return Err(HandshakeError::Timeout(timeout));
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn classify(frame: &Frame, reply: &ReplySchema) -> Result<(), HandshakeError> {
    if frame.message_id == reply.accept_id {
        debug!("handshake accepted");
        return Ok(());
    }

    if Some(frame.message_id) == reply.reject_id {
        // A refusal with an unreadable reason is still a refusal.
        let reason = reply
            .reject_reason
            .as_ref()
            .and_then(|spec| spec.read(frame.payload.as_ref(), "reject_reason").ok())
            .and_then(|value| value.as_uint())
            .unwrap_or(0) as u32;
        warn!(reason, "handshake rejected by server");
        return Err(HandshakeError::Rejected { reason });
    }

    Err(HandshakeError::Unexpected {
        message_id: frame.message_id,
        len: frame.payload.len(),
    })
}
