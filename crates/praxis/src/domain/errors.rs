//! Domain Errors
//!
//! Error types for domain and streaming operations.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failures while opening or reading a record stream.
///
/// A session never hands these to its caller directly: every variant is
/// folded into the terminal `StreamEvent::Error`.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream rejected (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed stream framing: {0}")]
    Framing(String),

    #[error("Malformed '{kind}' record: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stream ended before completion")]
    Closed,
}

impl StreamError {
    /// Message shown to the user when this error terminates a session.
    /// Backend `error` records never pass through here; they keep their text.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Status { status, body } if body.trim().is_empty() => {
                format!("Stream rejected (status {status})")
            }
            other => other.to_string(),
        }
    }
}
