use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Clone-able handle for requesting session shutdown.
///
/// Backed by a condvar so a pending backoff wait wakes immediately when
/// shutdown is triggered; the read loop polls it at frame boundaries.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

impl ShutdownHandle {
    /// Create a fresh, untriggered handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; wakes any pending [`Self::wait_timeout`].
    pub fn trigger(&self) {
        let mut triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *triggered = true;
        self.inner.condvar.notify_all();
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`, waking early on shutdown.
    ///
    /// Returns `true` if shutdown was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _timed_out) = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}
