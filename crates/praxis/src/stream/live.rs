//! Live session
//!
//! A stream session bound to the board it feeds. Each `step()` pulls one
//! event, folds it into the board and starts the typewriter reveal for
//! text chunks.

use tokio::sync::watch;

use crate::domain::value_objects::{SessionKind, SessionStatus};
use crate::ports::{StreamRequest, StreamTransport};
use crate::stream::board::Board;
use crate::stream::cancel::CancelHandle;
use crate::stream::event::StreamEvent;
use crate::stream::reveal::{RevealKey, RevealView};
use crate::stream::session::{StreamOptions, StreamSession};

pub struct LiveSession {
    stream: StreamSession,
    board: Board,
    options: StreamOptions,
}

impl LiveSession {
    pub async fn open<T>(
        transport: &T,
        request: StreamRequest,
        kind: SessionKind,
        options: StreamOptions,
    ) -> Self
    where
        T: StreamTransport + ?Sized,
    {
        let stream = StreamSession::open(transport, request, kind).await;
        let board = Board::new(kind, options.chunk_policy.clone());
        Self {
            stream,
            board,
            options,
        }
    }

    /// Apply the next event to the board and return it.
    ///
    /// `None` means the session is over: terminal event already returned,
    /// or cancelled (the board then reads `Cancelled`).
    pub async fn step(&mut self) -> Option<StreamEvent> {
        let Some(event) = self.stream.next_event().await else {
            if self.stream.is_cancelled() {
                self.board.mark_cancelled();
            }
            return None;
        };

        self.board.apply(&event);

        if let StreamEvent::FieldChunk(chunk) = &event {
            if self.options.typewriter {
                if let (Some(key), Some(text)) = (self.board.reveal_key(chunk), chunk.content.as_str()) {
                    self.stream
                        .reveals()
                        .reveal(key, text, self.options.reveal_speed);
                }
            }
        }

        Some(event)
    }

    /// Drive the session to its end and hand back the final board
    pub async fn run(mut self) -> Board {
        while self.step().await.is_some() {}
        self.board
    }

    /// Cancel and record it on the board. Returns `false` if the session
    /// had already ended or been cancelled.
    pub fn cancel(&mut self) -> bool {
        let performed = self.stream.cancel_handle().cancel();
        if self.stream.is_cancelled() {
            self.board.mark_cancelled();
        }
        performed
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> &SessionStatus {
        self.board.status()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.stream.cancel_handle()
    }

    pub fn session(&self) -> &StreamSession {
        &self.stream
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Currently revealed text for a key, if any reveal targeted it
    pub fn reveal_text(&self, key: &RevealKey) -> Option<String> {
        self.stream.reveals().text(key)
    }

    pub fn subscribe_reveals(&self) -> watch::Receiver<RevealView> {
        self.stream.reveals().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::replay::ReplayTransport;
    use serde_json::json;
    use std::time::Duration;

    fn analysis_script() -> ReplayTransport {
        ReplayTransport::new()
            .record("start", json!({"message": "Iniciando"}))
            .record("field_chunk", json!({"field": "resumo_executivo", "content": "O candidato"}))
            .record(
                "field_chunk",
                json!({"field": "resumo_executivo", "content": "O candidato tem experiência"}),
            )
            .record("complete", json!({"analysis": {"nota_geral": 72}, "analysis_id": 1}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_analysis_to_completion() {
        let transport = analysis_script();
        let live = LiveSession::open(
            &transport,
            StreamRequest::get("/resumes/4/analyze/stream"),
            SessionKind::Analysis,
            StreamOptions::default(),
        )
        .await;

        let board = live.run().await;
        let analysis = board.as_analysis().unwrap();

        assert_eq!(analysis.analysis().unwrap().nota_geral, 72);
        assert_eq!(
            analysis.analysis().unwrap().resumo_executivo,
            "O candidato tem experiência"
        );
        assert!(!analysis.is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_flushes_reveal() {
        let transport = analysis_script();
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::get("/resumes/4/analyze/stream"),
            SessionKind::Analysis,
            StreamOptions::default().with_reveal_speed(Duration::from_millis(50)),
        )
        .await;

        while live.step().await.is_some() {}

        let key = RevealKey::field("resumo_executivo");
        assert_eq!(
            live.reveal_text(&key).as_deref(),
            Some("O candidato tem experiência")
        );
        assert_eq!(live.session().reveals().pending(), 0);
    }

    #[tokio::test]
    async fn test_challenge_index_out_of_range_fails_once() {
        let transport = ReplayTransport::new()
            .record("challenge", json!({"number": 1, "total": 3, "data": {"title": "Corrigir bug"}}))
            .record("challenge_chunk", json!({"challenge_index": 500, "field": "title", "content": "x"}))
            .record("complete", json!({"total": 3}));
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::post("/challenges/generate/stream"),
            SessionKind::Challenges,
            StreamOptions::default().with_typewriter(false),
        )
        .await;

        let mut events = Vec::new();
        while let Some(event) = live.step().await {
            events.push(event);
        }

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], StreamEvent::Error { message } if message.contains("out of range")));
        let board = live.board().as_challenges().unwrap();
        assert!(board.catalog().is_empty());
        assert!(matches!(board.status(), SessionStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_typewriter_off_starts_no_reveals() {
        let transport = analysis_script();
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::get("/resumes/4/analyze/stream"),
            SessionKind::Analysis,
            StreamOptions::default().with_typewriter(false),
        )
        .await;

        while live.step().await.is_some() {}

        assert_eq!(live.reveal_text(&RevealKey::field("resumo_executivo")), None);
        assert_eq!(live.status(), &SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_upload_error_yields_single_error() {
        let transport = ReplayTransport::new()
            .record("start", json!({"message": "📤 Enviando"}))
            .record("error", json!({"message": "Arquivo corrompido"}))
            .record("complete", json!({}));
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::post("/resumes/upload/file/analyze"),
            SessionKind::Analysis,
            StreamOptions::default(),
        )
        .await;

        let mut events = Vec::new();
        while let Some(event) = live.step().await {
            events.push(event);
        }

        let errors = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Error { .. }))
            .count();
        assert_eq!(errors, 1);
        assert!(!events.iter().any(|e| matches!(e, StreamEvent::Complete(_))));
        assert_eq!(
            live.status(),
            &SessionStatus::Failed("Arquivo corrompido".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_stream() {
        let transport = ReplayTransport::new()
            .record("start", json!({}))
            .record("challenge_chunk", json!({"challenge_index": 0, "field": "title", "content": "Uma API REST"}))
            .delay(Duration::from_secs(10))
            .record("complete", json!({"total": 3}));
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::post("/challenges/generate/stream"),
            SessionKind::Challenges,
            StreamOptions::default(),
        )
        .await;

        live.step().await;
        live.step().await;
        assert_eq!(live.session().reveals().pending(), 1);

        assert!(live.cancel());
        assert!(!live.cancel());

        assert_eq!(live.session().reveals().pending(), 0);
        assert_eq!(live.step().await, None);
        assert_eq!(live.status(), &SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_external_cancel_marks_board() {
        let transport = ReplayTransport::new()
            .record("start", json!({}))
            .record("complete", json!({}));
        let mut live = LiveSession::open(
            &transport,
            StreamRequest::post("/challenges/generate/stream"),
            SessionKind::Challenges,
            StreamOptions::default(),
        )
        .await;
        let handle = live.cancel_handle();

        live.step().await;
        handle.cancel();

        assert_eq!(live.step().await, None);
        assert_eq!(live.status(), &SessionStatus::Cancelled);
    }
}
