//! Session boards
//!
//! UI-facing state of a stream. A board folds events in arrival order and
//! ignores everything once it has reached a terminal status.

use serde_json::Value;

use crate::domain::entities::{Challenge, ResumeAnalysis};
use crate::domain::value_objects::{SessionKind, SessionStatus};
use crate::stream::event::{Completion, FieldChunk, ItemComplete, Progress, StreamEvent, MAX_ITEMS};
use crate::stream::reducer::{ChunkPolicy, Draft};
use crate::stream::reveal::RevealKey;

/// Challenge generation: one draft per slot plus the finished catalog
#[derive(Debug, Clone)]
pub struct ChallengeBoard {
    slots: Vec<Draft>,
    catalog: Vec<Challenge>,
    progress: Progress,
    status: SessionStatus,
    total: Option<u32>,
    policy: ChunkPolicy,
}

impl ChallengeBoard {
    pub fn new(policy: ChunkPolicy) -> Self {
        Self {
            slots: initial_slots(SessionKind::Challenges),
            catalog: Vec::new(),
            progress: Progress::default(),
            status: SessionStatus::Running,
            total: None,
            policy,
        }
    }

    pub fn slots(&self) -> &[Draft] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Draft> {
        self.slots.get(index)
    }

    /// Completed challenges in arrival order
    pub fn catalog(&self) -> &[Challenge] {
        &self.catalog
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Expected number of challenges, once the backend has said
    pub fn total(&self) -> Option<u32> {
        self.total
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        if self.status.is_terminal() {
            tracing::debug!(kind = event.kind(), "Board is terminal; event ignored");
            return;
        }

        match event {
            StreamEvent::Start { message } => self.progress.message = message.clone(),
            StreamEvent::Progress(progress) => self.progress = progress.clone(),
            StreamEvent::FieldChunk(chunk) => self.apply_chunk(chunk),
            StreamEvent::ItemComplete(item) => self.apply_item(item),
            StreamEvent::Complete(completion) => {
                self.total = completion.total.or(self.total);
                complete_progress(&mut self.progress, completion);
                for slot in &mut self.slots {
                    slot.finish();
                }
                self.status = SessionStatus::Completed;
            }
            StreamEvent::Error { message } => {
                self.reset();
                self.status = SessionStatus::Failed(message.clone());
            }
        }
    }

    fn apply_chunk(&mut self, chunk: &FieldChunk) {
        let Some(index) = chunk.item_index else {
            tracing::warn!(field = %chunk.field, "Challenge chunk without index ignored");
            return;
        };
        let mode = self.policy.mode_for(&chunk.field);
        if let Some(slot) = self.slot_mut(index) {
            slot.apply_with(chunk, mode);
        }
    }

    fn apply_item(&mut self, item: &ItemComplete) {
        self.total = item.total.or(self.total);
        let Some(slot) = self.slot_mut(item.item_index) else {
            return;
        };
        slot.replace_with(item.data.clone());

        // a finished slot always has its catalog entry
        let challenge = Challenge::from_value_lossy(item.data.clone());
        tracing::debug!(
            number = item.number,
            title = %challenge.display_title(),
            "Challenge materialized"
        );
        self.catalog.push(challenge);
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Draft> {
        if index >= MAX_ITEMS {
            tracing::warn!(index, max = MAX_ITEMS, "Item index out of range; ignored");
            return None;
        }
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, Draft::loading);
        }
        self.slots.get_mut(index)
    }

    fn reset(&mut self) {
        self.slots = initial_slots(SessionKind::Challenges);
        self.catalog.clear();
        self.progress = Progress::default();
        self.total = None;
    }

    fn mark_cancelled(&mut self) {
        if !self.status.is_terminal() {
            self.status = SessionStatus::Cancelled;
        }
    }
}

/// Résumé analysis: a single draft plus the parsed final report
#[derive(Debug, Clone)]
pub struct AnalysisBoard {
    draft: Draft,
    progress: Progress,
    analysis: Option<ResumeAnalysis>,
    analysis_id: Option<i64>,
    resume_id: Option<i64>,
    status: SessionStatus,
    policy: ChunkPolicy,
}

impl AnalysisBoard {
    pub fn new(policy: ChunkPolicy) -> Self {
        Self {
            draft: Draft::loading(),
            progress: Progress::default(),
            analysis: None,
            analysis_id: None,
            resume_id: None,
            status: SessionStatus::Running,
            policy,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Final report, available after `complete`
    pub fn analysis(&self) -> Option<&ResumeAnalysis> {
        self.analysis.as_ref()
    }

    pub fn analysis_id(&self) -> Option<i64> {
        self.analysis_id
    }

    /// Known once the upload endpoint has stored the file
    pub fn resume_id(&self) -> Option<i64> {
        self.resume_id
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_in_progress(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        if self.status.is_terminal() {
            tracing::debug!(kind = event.kind(), "Board is terminal; event ignored");
            return;
        }

        match event {
            StreamEvent::Start { message } => self.progress.message = message.clone(),
            StreamEvent::Progress(progress) => {
                self.resume_id = progress.resume_id.or(self.resume_id);
                self.progress = progress.clone();
            }
            StreamEvent::FieldChunk(chunk) => {
                let mode = self.policy.mode_for(&chunk.field);
                self.draft.apply_with(chunk, mode);
            }
            StreamEvent::ItemComplete(item) => self.draft.replace_with(item.data.clone()),
            StreamEvent::Complete(completion) => self.complete(completion),
            StreamEvent::Error { message } => {
                self.draft = Draft::loading();
                self.progress = Progress::default();
                self.analysis = None;
                self.status = SessionStatus::Failed(message.clone());
            }
        }
    }

    fn complete(&mut self, completion: &Completion) {
        match &completion.analysis {
            Some(Value::Object(fields)) => self.draft.merge(fields),
            Some(other) => {
                tracing::warn!(payload = %other, "Analysis payload is not an object; keeping streamed fields");
                self.draft.finish();
            }
            None => self.draft.finish(),
        }

        match ResumeAnalysis::from_value(Value::Object(self.draft.fields().clone())) {
            Ok(analysis) => self.analysis = Some(analysis),
            Err(e) => tracing::warn!(error = %e, "Final analysis could not be parsed"),
        }

        self.analysis_id = completion.analysis_id.or(self.analysis_id);
        self.resume_id = completion.resume_id.or(self.resume_id);
        complete_progress(&mut self.progress, completion);
        self.status = SessionStatus::Completed;
    }

    fn mark_cancelled(&mut self) {
        if !self.status.is_terminal() {
            self.status = SessionStatus::Cancelled;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Board {
    Challenges(ChallengeBoard),
    Analysis(AnalysisBoard),
}

impl Board {
    pub fn new(kind: SessionKind, policy: ChunkPolicy) -> Self {
        match kind {
            SessionKind::Challenges => Board::Challenges(ChallengeBoard::new(policy)),
            SessionKind::Analysis => Board::Analysis(AnalysisBoard::new(policy)),
        }
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        match self {
            Board::Challenges(board) => board.apply(event),
            Board::Analysis(board) => board.apply(event),
        }
    }

    pub fn status(&self) -> &SessionStatus {
        match self {
            Board::Challenges(board) => board.status(),
            Board::Analysis(board) => board.status(),
        }
    }

    pub fn progress(&self) -> &Progress {
        match self {
            Board::Challenges(board) => board.progress(),
            Board::Analysis(board) => board.progress(),
        }
    }

    /// Record a user cancel; a board that already finished keeps its status
    pub fn mark_cancelled(&mut self) {
        match self {
            Board::Challenges(board) => board.mark_cancelled(),
            Board::Analysis(board) => board.mark_cancelled(),
        }
    }

    /// Where a chunk's text is revealed. Challenge chunks without an index
    /// have no slot and are not revealed.
    pub fn reveal_key(&self, chunk: &FieldChunk) -> Option<RevealKey> {
        match self {
            Board::Challenges(_) => chunk
                .item_index
                .map(|index| RevealKey::item(index, chunk.field.clone())),
            Board::Analysis(_) => Some(RevealKey::field(chunk.field.clone())),
        }
    }

    pub fn as_challenges(&self) -> Option<&ChallengeBoard> {
        match self {
            Board::Challenges(board) => Some(board),
            Board::Analysis(_) => None,
        }
    }

    pub fn as_analysis(&self) -> Option<&AnalysisBoard> {
        match self {
            Board::Analysis(board) => Some(board),
            Board::Challenges(_) => None,
        }
    }
}

fn initial_slots(kind: SessionKind) -> Vec<Draft> {
    (0..kind.initial_slots()).map(|_| Draft::loading()).collect()
}

fn complete_progress(progress: &mut Progress, completion: &Completion) {
    progress.percent = 100;
    if !completion.message.is_empty() {
        progress.message = completion.message.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RawRecord;
    use serde_json::json;

    fn event(kind: &str, data: Value) -> StreamEvent {
        StreamEvent::decode(&RawRecord::json(kind, data))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_analysis_stream_builds_report() {
        let mut board = AnalysisBoard::new(ChunkPolicy::default());
        let events = [
            event("start", json!({"message": "Iniciando análise"})),
            event("progress", json!({"percent": 20, "message": "Lendo currículo"})),
            event("field_chunk", json!({"field": "resumo_executivo", "content": "O candidato", "is_complete": false})),
            event("field_chunk", json!({"field": "resumo_executivo", "content": "O candidato tem experiência", "is_complete": true})),
            event("complete", json!({
                "analysis": {"nota_geral": 72, "pontos_fortes": ["Python"]},
                "analysis_id": 9,
                "resume_id": 4,
                "message": "Análise concluída"
            })),
        ];
        for e in &events {
            board.apply(e);
        }

        let analysis = board.analysis().unwrap();
        assert_eq!(analysis.nota_geral, 72);
        assert_eq!(analysis.resumo_executivo, "O candidato tem experiência");
        assert_eq!(analysis.pontos_fortes, vec!["Python".to_string()]);
        assert!(!board.is_in_progress());
        assert_eq!(board.analysis_id(), Some(9));
        assert_eq!(board.resume_id(), Some(4));
        assert_eq!(board.progress().percent, 100);
        assert_eq!(board.status(), &SessionStatus::Completed);
    }

    #[test]
    fn test_upload_progress_carries_resume_id() {
        let mut board = AnalysisBoard::new(ChunkPolicy::default());
        board.apply(&event("progress", json!({"percent": 40, "resume_id": 12})));
        board.apply(&event("progress", json!({"percent": 60})));

        assert_eq!(board.resume_id(), Some(12));
        assert_eq!(board.progress().percent, 60);
    }

    #[test]
    fn test_challenges_fill_catalog_in_arrival_order() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        board.apply(&event(
            "challenge_chunk",
            json!({"challenge_index": 0, "field": "title", "content": "Corrigir"}),
        ));
        board.apply(&event(
            "challenge",
            json!({"number": 1, "total": 3, "data": {"title": "Corrigir bug", "category": "code"}}),
        ));
        board.apply(&event(
            "challenge",
            json!({"number": 2, "total": 3, "data": {"title": "Escrever API", "category": "code"}}),
        ));

        assert_eq!(board.catalog().len(), 2);
        assert_eq!(board.catalog()[0].title, "Corrigir bug");
        assert_eq!(board.catalog()[1].title, "Escrever API");
        assert!(!board.slot(0).unwrap().is_loading());
        assert!(!board.slot(1).unwrap().is_loading());
        assert!(board.slot(2).unwrap().is_loading());
        assert_eq!(board.total(), Some(3));
    }

    #[test]
    fn test_chunk_without_index_is_ignored() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        board.apply(&event("field_chunk", json!({"field": "title", "content": "x"})));

        assert!(board.slots().iter().all(|slot| slot.fields().is_empty()));
    }

    #[test]
    fn test_slots_grow_for_high_index() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        board.apply(&event(
            "challenge_chunk",
            json!({"challenge_index": 4, "field": "title", "content": "Extra"}),
        ));

        assert_eq!(board.slots().len(), 5);
        assert_eq!(board.slot(4).unwrap().text("title"), Some("Extra"));
    }

    #[test]
    fn test_loose_items_still_reach_catalog() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        board.apply(&event(
            "challenge",
            json!({"number": 1, "total": 2, "data": {
                "title": "Corrigir bug de login",
                "difficulty": {"level": "Fácil", "time_limit": 30.0}
            }}),
        ));
        board.apply(&event(
            "challenge",
            json!({"number": 2, "total": 2, "data": {
                "title": "Planejar sprint",
                "description": {"text": "Organize", "hints": null}
            }}),
        ));
        board.apply(&event(
            "challenge",
            json!({"number": 3, "data": {"title": "Revisar PR", "difficulty": "hard"}}),
        ));

        let titles: Vec<_> = board.catalog().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Corrigir bug de login", "Planejar sprint", "Revisar PR"]);
        assert_eq!(board.catalog()[0].difficulty.time_limit, 30);
        assert!(board.slots().iter().all(|slot| !slot.is_loading()));
    }

    #[test]
    fn test_out_of_range_index_does_not_grow_slots() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        let chunk = FieldChunk {
            item_index: Some(usize::MAX),
            field: "title".to_string(),
            content: json!("x"),
            is_complete: false,
        };
        board.apply(&StreamEvent::FieldChunk(chunk));
        board.apply(&StreamEvent::ItemComplete(ItemComplete {
            item_index: 1_000_000_000,
            number: 1,
            total: None,
            data: json!({"title": "x"}),
        }));

        assert_eq!(board.slots().len(), 3);
        assert!(board.catalog().is_empty());
        assert_eq!(board.status(), &SessionStatus::Running);
    }

    #[test]
    fn test_error_resets_and_freezes_board() {
        let mut board = ChallengeBoard::new(ChunkPolicy::default());
        board.apply(&event("challenge", json!({"number": 1, "data": {"title": "a"}})));
        board.apply(&event("error", json!({"message": "Cota excedida"})));
        board.apply(&event("challenge", json!({"number": 2, "data": {"title": "b"}})));

        assert!(board.catalog().is_empty());
        assert_eq!(board.slots().len(), 3);
        assert!(board.slots().iter().all(Draft::is_loading));
        assert_eq!(board.status(), &SessionStatus::Failed("Cota excedida".to_string()));
    }

    #[test]
    fn test_cancel_does_not_override_completion() {
        let mut board = Board::new(SessionKind::Analysis, ChunkPolicy::default());
        board.apply(&event("complete", json!({})));
        board.mark_cancelled();
        assert_eq!(board.status(), &SessionStatus::Completed);

        let mut running = Board::new(SessionKind::Challenges, ChunkPolicy::default());
        running.mark_cancelled();
        assert_eq!(running.status(), &SessionStatus::Cancelled);
    }

    #[test]
    fn test_reveal_keys_per_board_kind() {
        let chunk = FieldChunk {
            item_index: Some(1),
            field: "title".to_string(),
            content: json!("x"),
            is_complete: false,
        };

        let challenges = Board::new(SessionKind::Challenges, ChunkPolicy::default());
        let analysis = Board::new(SessionKind::Analysis, ChunkPolicy::default());

        assert_eq!(challenges.reveal_key(&chunk), Some(RevealKey::item(1, "title")));
        assert_eq!(analysis.reveal_key(&chunk), Some(RevealKey::field("title")));
    }
}
