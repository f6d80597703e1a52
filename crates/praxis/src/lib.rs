//! Praxis Streaming Core
//!
//! Client-side bridge between the Praxis backend's Server-Sent Event streams
//! and UI state: challenge generation and résumé analysis both arrive as a
//! sequence of typed records that are folded into drafts and revealed
//! character by character.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): entities and errors
//!   - `entities/`: Challenge, ResumeAnalysis
//!   - `value_objects/`: DifficultyLevel, SessionKind, SessionStatus
//!   - `errors/`: DomainError, StreamError
//!
//! - **Ports** (`ports/`): the `StreamTransport` interface
//!
//! - **Stream** (`stream/`): framing, event decoding, reducer, reveal driver,
//!   cancellation, session boards
//!
//! # Usage
//!
//! ```rust,ignore
//! use praxis::{LiveSession, SessionKind, StreamOptions, StreamRequest};
//!
//! let mut live = LiveSession::open(&transport, request, SessionKind::Analysis, StreamOptions::default()).await;
//! let cancel = live.cancel_handle();
//! while let Some(event) = live.step().await {
//!     // match on event, read live.board()
//! }
//! ```

pub mod domain;
pub mod ports;
pub mod stream;

pub use domain::{
    Challenge, ChallengeDescription, ChallengeFs, Difficulty, DifficultyLevel, DomainError,
    ResumeAnalysis, SessionKind, SessionStatus, StreamError,
};
pub use ports::{FileAttachment, RawRecord, RecordStream, RequestBody, StreamMethod, StreamRequest, StreamTransport};
pub use stream::{
    AnalysisBoard, Board, CancelHandle, ChallengeBoard, ChunkMode, ChunkPolicy, Completion, Draft,
    FieldChunk, ItemComplete, LiveSession, Progress, ReplayTransport, RevealDriver, RevealKey,
    RevealView, SseDecoder, StreamEvent, StreamOptions, StreamSession,
};
