//! Replay transport
//!
//! Plays back a scripted or captured record sequence through the same
//! session machinery as a live connection. Used for offline replays of SSE
//! captures and for driving sessions in tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::StreamError;
use crate::ports::{RawRecord, RecordStream, StreamRequest, StreamTransport};
use crate::stream::sse;

#[derive(Debug, Clone, PartialEq)]
enum ReplayStep {
    Record(RawRecord),
    Delay(Duration),
    Fail(String),
}

#[derive(Debug, Clone, Default)]
pub struct ReplayTransport {
    script: Vec<ReplayStep>,
    reject: Option<(u16, String)>,
    pace: Option<Duration>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self {
            script: records.into_iter().map(ReplayStep::Record).collect(),
            ..Self::default()
        }
    }

    /// Build a replay from a raw `text/event-stream` capture
    pub fn from_sse(bytes: &[u8]) -> Result<Self, StreamError> {
        Ok(Self::from_records(sse::decode_all(bytes)?))
    }

    pub fn record(self, kind: &str, data: serde_json::Value) -> Self {
        self.raw(RawRecord::json(kind, data))
    }

    pub fn raw(mut self, record: RawRecord) -> Self {
        self.script.push(ReplayStep::Record(record));
        self
    }

    pub fn delay(mut self, duration: Duration) -> Self {
        self.script.push(ReplayStep::Delay(duration));
        self
    }

    /// End the stream with a transport failure at this point
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.script.push(ReplayStep::Fail(message.into()));
        self
    }

    /// Refuse to open, as a server answering with a non-2xx status would
    pub fn reject(mut self, status: u16, body: impl Into<String>) -> Self {
        self.reject = Some((status, body.into()));
        self
    }

    /// Wait this long before every record
    pub fn paced(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn len(&self) -> usize {
        self.script
            .iter()
            .filter(|step| matches!(step, ReplayStep::Record(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Playback {
    steps: VecDeque<ReplayStep>,
    cancel: CancellationToken,
    pace: Option<Duration>,
}

impl Playback {
    /// Sleep unless cancelled first; false means stop
    async fn wait(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[async_trait]
impl StreamTransport for ReplayTransport {
    async fn open(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<RecordStream, StreamError> {
        if let Some((status, body)) = &self.reject {
            return Err(StreamError::Status {
                status: *status,
                body: body.clone(),
            });
        }

        tracing::debug!(path = %request.path, records = self.len(), "Replaying recorded stream");

        let playback = Playback {
            steps: self.script.iter().cloned().collect(),
            cancel,
            pace: self.pace,
        };

        let stream = futures::stream::unfold(playback, |mut playback| async move {
            loop {
                if playback.cancel.is_cancelled() {
                    return None;
                }
                match playback.steps.pop_front()? {
                    ReplayStep::Delay(duration) => {
                        if !playback.wait(duration).await {
                            return None;
                        }
                    }
                    ReplayStep::Record(record) => {
                        if let Some(pace) = playback.pace {
                            if !playback.wait(pace).await {
                                return None;
                            }
                        }
                        return Some((Ok(record), playback));
                    }
                    ReplayStep::Fail(message) => {
                        playback.steps.clear();
                        return Some((Err(StreamError::Transport(message)), playback));
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_plays_records_in_order() {
        let transport = ReplayTransport::new()
            .record("start", json!({}))
            .record("complete", json!({}));

        let records: Vec<_> = transport
            .open(StreamRequest::get("/"), CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        let kinds: Vec<_> = records
            .into_iter()
            .map(|r| r.unwrap().kind)
            .collect();
        assert_eq!(kinds, vec!["start", "complete"]);
    }

    #[tokio::test]
    async fn test_from_sse_capture() {
        let capture = b"event: start\ndata: {}\n\n: ping\n\nevent: complete\ndata: {\"total\": 3}\n\n";
        let transport = ReplayTransport::from_sse(capture).unwrap();
        assert_eq!(transport.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_ends_stream() {
        let transport = ReplayTransport::new()
            .fail("reset")
            .record("complete", json!({}));

        let records: Vec<_> = transport
            .open(StreamRequest::get("/"), CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Err(StreamError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_waits_before_each_record() {
        let transport = ReplayTransport::new()
            .record("start", json!({}))
            .record("complete", json!({}))
            .paced(Duration::from_millis(200));

        let started = tokio::time::Instant::now();
        let records: Vec<_> = transport
            .open(StreamRequest::get("/"), CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(records.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_playback() {
        let cancel = CancellationToken::new();
        let transport = ReplayTransport::new()
            .record("start", json!({}))
            .delay(Duration::from_secs(30))
            .record("complete", json!({}));

        let mut stream = transport
            .open(StreamRequest::get("/"), cancel.clone())
            .await
            .unwrap();
        assert!(stream.next().await.is_some());

        cancel.cancel();
        assert!(stream.next().await.is_none());
    }
}
