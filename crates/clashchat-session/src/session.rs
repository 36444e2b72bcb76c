use std::fmt;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clashchat_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, DEFAULT_MAX_FRAME};
use clashchat_transport::Dial;
use clashchat_wire::{ChatEvent, Decoded, FrameDecoder, WireSchema};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backoff::BackoffConfig;
use crate::credentials::Credentials;
use crate::error::SessionError;
use crate::handshake::{perform, HandshakeError};
use crate::shutdown::ShutdownHandle;
use crate::template::HandshakeTemplate;

/// Connection lifecycle state, owned exclusively by the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Handshaking = 1,
    Active = 2,
    Reconnecting = 3,
}

/// Read-only, eventually-consistent view of the session state.
///
/// A query may lag the true state by one transition; nothing outside the
/// loop can mutate it.
#[derive(Debug, Clone)]
pub struct StateWatch {
    cell: Arc<AtomicU8>,
}

impl StateWatch {
    fn new() -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(SessionState::Disconnected as u8)),
        }
    }

    fn set(&self, state: SessionState) {
        self.cell.store(state as u8, Ordering::Release);
    }

    /// Current state snapshot.
    pub fn get(&self) -> SessionState {
        match self.cell.load(Ordering::Acquire) {
            1 => SessionState::Handshaking,
            2 => SessionState::Active,
            3 => SessionState::Reconnecting,
            _ => SessionState::Disconnected,
        }
    }
}

/// Out-of-band status notifications delivered alongside chat events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Handshake accepted; chat frames will follow.
    Connected,
    /// Transport lost; attempt `attempt` starts after backoff.
    Reconnecting { attempt: u32 },
    /// The server refused the credentials. Terminal.
    HandshakeRejected { reason: u32 },
    /// The reconnect ceiling was exceeded. Terminal.
    Abandoned { attempts: u32 },
}

/// A dispatch callback declined an event (downstream buffer full, consumer
/// gone). Never tears down the session.
#[derive(Debug)]
pub struct DispatchRejected {
    pub reason: String,
}

impl fmt::Display for DispatchRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dispatch rejected: {}", self.reason)
    }
}

impl std::error::Error for DispatchRejected {}

/// Consumer of decoded chat events and session status.
///
/// The protocol layer's job ends at successful decode; rendering, history,
/// and persistence all live behind this trait.
pub trait Dispatch {
    /// Deliver one decoded chat message.
    fn on_chat(&mut self, event: ChatEvent) -> Result<(), DispatchRejected>;

    /// Deliver a status notification.
    fn on_status(&mut self, status: StatusEvent) {
        let _ = status;
    }
}

/// Optional captured keepalive frame replayed while the session is active.
///
/// The stock game client polls the chat channel on a short interval; post-auth
/// packets are opaque captures here, same as the handshake template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    /// Pre-encoded keepalive frame, hex in config, replayed verbatim.
    #[serde(with = "crate::serde_hex")]
    pub frame: Vec<u8>,
    /// Replay interval in milliseconds.
    pub interval_ms: u64,
}

/// Session tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum accepted frame size in bytes.
    pub max_frame_size: usize,
    /// Read timeout while active; bounds how often the loop can observe a
    /// shutdown request or a due keepalive.
    pub read_timeout_ms: u64,
    /// How long to wait for the handshake reply.
    pub handshake_timeout_ms: u64,
    /// Reconnect ceiling; exceeding it abandons the session.
    pub max_reconnects: u32,
    /// Reconnect backoff policy.
    pub backoff: BackoffConfig,
    /// Optional keepalive replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<KeepaliveConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_timeout_ms: 500,
            handshake_timeout_ms: 5_000,
            max_reconnects: 5,
            backoff: BackoffConfig::default(),
            keepalive: None,
        }
    }
}

/// A single protocol session: dial, handshake, decode loop, reconnect.
///
/// Plain value, no global state: construct as many as needed (tests run
/// several against fake dialers). One call to [`Session::run`] owns the
/// connection for its whole life; the caller's thread drives the loop.
pub struct Session<D: Dial> {
    dialer: D,
    template: HandshakeTemplate,
    credentials: Credentials,
    schema: WireSchema,
    config: SessionConfig,
    state: StateWatch,
    shutdown: ShutdownHandle,
}

enum LoopExit {
    Shutdown,
    Transport(FrameError),
}

enum AttemptError {
    /// Active refusal; terminal.
    Rejected { reason: u32 },
    /// Anything connection-shaped; retry through backoff.
    Retry(String),
    /// Config-level failure (template/credentials mismatch); terminal.
    Fatal(SessionError),
}

impl<D: Dial> Session<D> {
    /// Build a session over a dialer and its externally supplied protocol
    /// configuration.
    pub fn new(
        dialer: D,
        template: HandshakeTemplate,
        credentials: Credentials,
        schema: WireSchema,
        config: SessionConfig,
    ) -> Self {
        Self {
            dialer,
            template,
            credentials,
            schema,
            config,
            state: StateWatch::new(),
            shutdown: ShutdownHandle::new(),
        }
    }

    /// Handle for requesting shutdown from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Read-only state observer.
    pub fn state_watch(&self) -> StateWatch {
        self.state.clone()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Drive the session until it terminates.
    ///
    /// Returns `Ok(())` on requested shutdown; otherwise one of the fatal
    /// outcomes in [`SessionError`]. Transport trouble never surfaces here
    /// directly, it feeds the reconnect path.
    pub fn run(&mut self, dispatch: &mut dyn Dispatch) -> Result<(), SessionError> {
        let decoder = FrameDecoder::new(self.schema.chat.clone());
        let mut attempt: u32 = 0;

        loop {
            if self.shutdown.is_triggered() {
                self.state.set(SessionState::Disconnected);
                return Ok(());
            }

            self.state.set(SessionState::Handshaking);
            match self.connect_and_handshake() {
                Ok((reader, writer)) => {
                    attempt = 0;
                    self.state.set(SessionState::Active);
                    info!("session active");
                    dispatch.on_status(StatusEvent::Connected);

                    match self.read_loop(reader, writer, &decoder, dispatch) {
                        LoopExit::Shutdown => {
                            self.state.set(SessionState::Disconnected);
                            return Ok(());
                        }
                        LoopExit::Transport(err) => {
                            warn!(error = %err, "transport failure while active");
                        }
                    }
                }
                Err(AttemptError::Rejected { reason }) => {
                    self.state.set(SessionState::Disconnected);
                    dispatch.on_status(StatusEvent::HandshakeRejected { reason });
                    return Err(SessionError::HandshakeRejected { reason });
                }
                Err(AttemptError::Fatal(err)) => {
                    self.state.set(SessionState::Disconnected);
                    return Err(err);
                }
                Err(AttemptError::Retry(cause)) => {
                    debug!(%cause, "connection attempt failed");
                }
            }

            attempt += 1;
            if attempt > self.config.max_reconnects {
                let attempts = self.config.max_reconnects;
                self.state.set(SessionState::Disconnected);
                dispatch.on_status(StatusEvent::Abandoned { attempts });
                return Err(SessionError::Abandoned { attempts });
            }

            self.state.set(SessionState::Reconnecting);
            dispatch.on_status(StatusEvent::Reconnecting { attempt });
            let delay = self.config.backoff.delay_for(attempt);
            debug!(attempt, ?delay, "reconnect backoff");
            if self.shutdown.wait_timeout(delay) {
                self.state.set(SessionState::Disconnected);
                return Ok(());
            }
        }
    }

    fn connect_and_handshake(
        &mut self,
    ) -> Result<(FrameReader<D::Stream>, FrameWriter<D::Stream>), AttemptError> {
        let frame_config = FrameConfig {
            max_frame_size: self.config.max_frame_size,
            read_timeout: Some(Duration::from_millis(self.config.read_timeout_ms)),
            write_timeout: None,
        };

        let mut stream = self
            .dialer
            .dial()
            .map_err(|err| AttemptError::Retry(err.to_string()))?;
        self.dialer
            .set_read_timeout(&mut stream, frame_config.read_timeout)
            .map_err(|err| AttemptError::Retry(err.to_string()))?;
        let write_stream = self
            .dialer
            .clone_stream(&stream)
            .map_err(|err| AttemptError::Retry(err.to_string()))?;

        let mut reader = FrameReader::with_config(stream, frame_config.clone());
        let mut writer = FrameWriter::with_config(write_stream, frame_config);

        let timeout = Duration::from_millis(self.config.handshake_timeout_ms);
        match perform(
            &mut reader,
            &mut writer,
            &self.template,
            &self.credentials,
            &self.schema.reply,
            timeout,
        ) {
            Ok(()) => Ok((reader, writer)),
            Err(HandshakeError::Rejected { reason }) => Err(AttemptError::Rejected { reason }),
            Err(HandshakeError::Template(err)) => {
                Err(AttemptError::Fatal(SessionError::Template(err)))
            }
            Err(err @ HandshakeError::Unexpected { .. }) => {
                warn!(error = %err, "handshake reply did not match any known signature");
                Err(AttemptError::Retry(err.to_string()))
            }
            Err(err) => Err(AttemptError::Retry(err.to_string())),
        }
    }

    fn read_loop(
        &self,
        mut reader: FrameReader<D::Stream>,
        mut writer: FrameWriter<D::Stream>,
        decoder: &FrameDecoder,
        dispatch: &mut dyn Dispatch,
    ) -> LoopExit {
        let keepalive = self.config.keepalive.clone();
        let mut keepalive_due = keepalive
            .as_ref()
            .map(|ka| Instant::now() + Duration::from_millis(ka.interval_ms));

        loop {
            // Cancellation lands here, at a frame boundary; partial bytes
            // stay buffered in the reader until then.
            if self.shutdown.is_triggered() {
                return LoopExit::Shutdown;
            }

            if let (Some(ka), Some(due)) = (&keepalive, &mut keepalive_due) {
                if Instant::now() >= *due {
                    if let Err(err) = writer.send_raw(&ka.frame) {
                        return LoopExit::Transport(err);
                    }
                    debug!("keepalive sent");
                    *due = Instant::now() + Duration::from_millis(ka.interval_ms);
                }
            }

            let frame = match reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::Io(err))
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    continue; // poll tick: shutdown and keepalive get a look
                }
                Err(err) => return LoopExit::Transport(err),
            };

            match decoder.decode(&frame) {
                Ok(Decoded::Chat(events)) => {
                    for event in events {
                        if let Err(rejected) = dispatch.on_chat(event) {
                            warn!(%rejected, "chat event dropped by dispatcher");
                        }
                    }
                }
                Ok(Decoded::Unrecognized { message_id }) => {
                    debug!(
                        message_id = format_args!("{message_id:#06x}"),
                        "skipping unrecognized frame"
                    );
                }
                Err(err) => {
                    // One corrupt message, not a dead session.
                    warn!(error = %err, message_id = frame.message_id, "skipping undecodable chat frame");
                }
            }
        }
    }
}

impl<D: Dial> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state.get())
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_watch_roundtrips_every_state() {
        let watch = StateWatch::new();
        assert_eq!(watch.get(), SessionState::Disconnected);
        for state in [
            SessionState::Handshaking,
            SessionState::Active,
            SessionState::Reconnecting,
            SessionState::Disconnected,
        ] {
            watch.set(state);
            assert_eq!(watch.get(), state);
        }
    }

    #[test]
    fn status_event_serializes_tagged() {
        let json = serde_json::to_string(&StatusEvent::Reconnecting { attempt: 2 }).unwrap();
        assert_eq!(json, r#"{"status":"reconnecting","attempt":2}"#);
    }

    #[test]
    fn session_config_default_roundtrips() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_session_config_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"max_reconnects": 2}"#).unwrap();
        assert_eq!(config.max_reconnects, 2);
        assert_eq!(config.read_timeout_ms, SessionConfig::default().read_timeout_ms);
    }
}
