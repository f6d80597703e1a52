//! Cancellation handle
//!
//! The one capability a stream session hands out. Cancelling aborts the
//! transport, clears the reveal timers and deactivates the session, in that
//! order. Teardown happens at most once: the first of `cancel()` or natural
//! termination claims it, and every later call is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::stream::reveal::RevealDriver;

#[derive(Debug)]
struct CancelInner {
    session_id: Uuid,
    transport: CancellationToken,
    reveals: RevealDriver,
    claimed: AtomicBool,
    cancelled: AtomicBool,
    active: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    pub(crate) fn new(session_id: Uuid, reveals: RevealDriver) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                session_id,
                transport: CancellationToken::new(),
                reveals,
                claimed: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Cancel the session.
    ///
    /// Returns `true` for the call that performed the teardown, `false` if
    /// the session had already been cancelled or had finished on its own.
    /// Never fails; cancellation is a normal terminal transition.
    pub fn cancel(&self) -> bool {
        if self.inner.claimed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.cancelled.store(true, Ordering::SeqCst);

        self.inner.transport.cancel();
        let cleared = self.inner.reveals.clear();
        self.inner.active.store(false, Ordering::SeqCst);

        tracing::info!(
            session_id = %self.inner.session_id,
            cleared_timers = cleared,
            "Stream session cancelled"
        );
        true
    }

    /// True once `cancel()` has torn the session down
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// False once the session was cancelled or reached a terminal record
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst) && !self.inner.transport.is_cancelled()
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub(crate) fn transport_token(&self) -> CancellationToken {
        self.inner.transport.clone()
    }

    /// Natural termination: release the transport without touching the
    /// reveal state, which the session has already flushed or cleared.
    pub(crate) fn finish(&self) -> bool {
        if self.inner.claimed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.transport.cancel();
        self.inner.active.store(false, Ordering::SeqCst);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::reveal::RevealKey;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let reveals = RevealDriver::new();
        let handle = CancelHandle::new(Uuid::new_v4(), reveals.clone());
        let token = handle.transport_token();

        reveals.reveal(RevealKey::field("title"), "abc", Duration::from_millis(10));
        assert_eq!(reveals.pending(), 1);

        assert!(handle.cancel());
        assert!(token.is_cancelled());
        assert_eq!(reveals.pending(), 0);
        assert!(!handle.is_active());

        let clone = handle.clone();
        assert!(!clone.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_finish_keeps_reveal_state() {
        let reveals = RevealDriver::new();
        let handle = CancelHandle::new(Uuid::new_v4(), reveals.clone());
        let key = RevealKey::field("resumo_executivo");

        reveals.reveal(key.clone(), "texto", Duration::from_millis(10));
        reveals.flush();
        assert!(handle.finish());

        assert!(!handle.cancel());
        assert!(!handle.is_cancelled());
        assert_eq!(reveals.text(&key).as_deref(), Some("texto"));
    }
}
