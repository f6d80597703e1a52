//! Stream session
//!
//! One in-flight streaming request: the record stream, its cancellation
//! handle and its reveal timers. Records are decoded in arrival order into
//! `StreamEvent`s; every failure is normalized into exactly one terminal
//! `StreamEvent::Error`, after which the session yields nothing more.

use std::time::Duration;

use futures::StreamExt;
use uuid::Uuid;

use crate::domain::errors::StreamError;
use crate::domain::value_objects::SessionKind;
use crate::ports::{RecordStream, StreamRequest, StreamTransport};
use crate::stream::cancel::CancelHandle;
use crate::stream::event::StreamEvent;
use crate::stream::reducer::ChunkPolicy;
use crate::stream::reveal::RevealDriver;

/// Default delay between two revealed characters
pub const DEFAULT_REVEAL_SPEED: Duration = Duration::from_millis(15);

/// Caller-side options for a session
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Delay between revealed characters
    pub reveal_speed: Duration,
    /// Whether text chunks are revealed character by character
    pub typewriter: bool,
    /// Replace/append mode per field
    pub chunk_policy: ChunkPolicy,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            reveal_speed: DEFAULT_REVEAL_SPEED,
            typewriter: true,
            chunk_policy: ChunkPolicy::default(),
        }
    }
}

impl StreamOptions {
    pub fn with_reveal_speed(mut self, speed: Duration) -> Self {
        self.reveal_speed = speed;
        self
    }

    pub fn with_typewriter(mut self, enabled: bool) -> Self {
        self.typewriter = enabled;
        self
    }

    pub fn with_chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.chunk_policy = policy;
        self
    }
}

pub struct StreamSession {
    id: Uuid,
    kind: SessionKind,
    records: Option<RecordStream>,
    open_error: Option<StreamError>,
    control: CancelHandle,
    reveals: RevealDriver,
    terminated: bool,
    delivered: usize,
}

impl StreamSession {
    /// Open a session. Never fails: a transport that cannot open is
    /// reported as the session's first (and terminal) event.
    pub async fn open<T>(transport: &T, request: StreamRequest, kind: SessionKind) -> Self
    where
        T: StreamTransport + ?Sized,
    {
        let id = Uuid::new_v4();
        let reveals = RevealDriver::new();
        let control = CancelHandle::new(id, reveals.clone());

        tracing::info!(
            session_id = %id,
            kind = %kind,
            path = %request.path,
            transport = transport.name(),
            "Opening stream session"
        );

        let (records, open_error) = match transport.open(request, control.transport_token()).await {
            Ok(records) => (Some(records), None),
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Stream failed to open");
                (None, Some(e))
            }
        };

        Self {
            id,
            kind,
            records,
            open_error,
            control,
            reveals,
            terminated: false,
            delivered: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Cloneable handle for cancelling from elsewhere (signal handler, UI)
    pub fn cancel_handle(&self) -> CancelHandle {
        self.control.clone()
    }

    pub fn reveals(&self) -> &RevealDriver {
        &self.reveals
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// Events delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Next event, or `None` once the session is terminated or cancelled.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if self.terminated || !self.control.is_active() {
                return None;
            }
            if let Some(err) = self.open_error.take() {
                return Some(self.fail(err));
            }

            let token = self.control.transport_token();
            let records = self.records.as_mut()?;
            let item = tokio::select! {
                biased;
                _ = token.cancelled() => return None,
                item = records.next() => item,
            };

            // cancel() may have run while a buffered record was in hand
            if !self.control.is_active() {
                return None;
            }

            let record = match item {
                None => return Some(self.fail(StreamError::Closed)),
                Some(Err(e)) => return Some(self.fail(e)),
                Some(Ok(record)) => record,
            };

            match StreamEvent::decode(&record) {
                Ok(Some(event)) => {
                    if event.is_terminal() {
                        self.terminate(&event);
                    }
                    self.delivered += 1;
                    return Some(event);
                }
                Ok(None) => {
                    tracing::debug!(session_id = %self.id, kind = %record.kind, "Skipping unknown record kind");
                }
                Err(e) => {
                    tracing::warn!(session_id = %self.id, error = %e, "Protocol error in stream");
                    return Some(self.fail(e));
                }
            }
        }
    }

    fn fail(&mut self, err: StreamError) -> StreamEvent {
        let event = StreamEvent::Error {
            message: err.user_message(),
        };
        self.terminate(&event);
        self.delivered += 1;
        event
    }

    fn terminate(&mut self, event: &StreamEvent) {
        self.terminated = true;
        self.records = None;

        match event {
            StreamEvent::Complete(_) => {
                self.reveals.flush();
            }
            _ => {
                self.reveals.clear();
            }
        }
        self.control.finish();

        tracing::info!(
            session_id = %self.id,
            kind = %self.kind,
            terminal = event.kind(),
            "Stream session finished"
        );
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if !self.terminated {
            self.control.cancel();
        }
    }
}
