//! Streaming Core
//!
//! - `sse`: byte stream -> framed records
//! - `event`: framed record -> `StreamEvent`
//! - `reducer`: field chunks -> drafts
//! - `reveal`: typewriter timers
//! - `cancel`: teardown handle
//! - `session` / `live` / `board`: one request from open to terminal event
//! - `replay`: scripted transport for captures and tests

pub mod board;
pub mod cancel;
pub mod event;
pub mod live;
pub mod reducer;
pub mod replay;
pub mod reveal;
pub mod session;
pub mod sse;

pub use board::{AnalysisBoard, Board, ChallengeBoard};
pub use cancel::CancelHandle;
pub use event::{Completion, FieldChunk, ItemComplete, Progress, StreamEvent, MAX_ITEMS};
pub use live::LiveSession;
pub use reducer::{reduce, ChunkMode, ChunkPolicy, Draft};
pub use replay::ReplayTransport;
pub use reveal::{RevealDriver, RevealKey, RevealView};
pub use session::{StreamOptions, StreamSession, DEFAULT_REVEAL_SPEED};
pub use sse::{decode_all, SseDecoder};
