//! Stream events
//!
//! Single sum type over every record kind the backend emits. Callers fold
//! over it with `match`; there are no optional callback slots to forget.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::errors::StreamError;
use crate::ports::RawRecord;

/// Highest number of items a multi-item stream may address. Indexes at or
/// past it are protocol errors rather than slot allocations.
pub const MAX_ITEMS: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Operation accepted, no data yet
    Start { message: String },
    /// Coarse estimate; not guaranteed to increase strictly
    Progress(Progress),
    /// Partial value for one field of one item
    FieldChunk(FieldChunk),
    /// One item fully materialized; supersedes its draft
    ItemComplete(ItemComplete),
    /// Terminal success
    Complete(Completion),
    /// Terminal failure
    Error { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, deserialize_with = "percent")]
    pub percent: u8,
    #[serde(default)]
    pub message: String,
    /// Set by the upload endpoint once the résumé is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChunk {
    #[serde(default, alias = "challenge_index", skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
    pub field: String,
    /// Full current value of the field (cumulative prefix, whole array, ...)
    pub content: serde_json::Value,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemComplete {
    pub item_index: usize,
    /// 1-based position in arrival order
    pub number: u32,
    pub total: Option<u32>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<i64>,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ItemCompletePayload {
    #[serde(default, alias = "challenge_index")]
    item_index: Option<usize>,
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    data: serde_json::Value,
}

impl StreamEvent {
    /// Decode a framed record.
    ///
    /// Unknown kinds yield `Ok(None)` so newer backends stay compatible; a
    /// known kind with a broken payload is a protocol error.
    pub fn decode(record: &RawRecord) -> Result<Option<Self>, StreamError> {
        let kind = record.kind.as_str();
        let data = record.data.as_str();

        let event = match kind {
            "start" => {
                let payload: MessagePayload = parse(kind, data)?;
                StreamEvent::Start {
                    message: payload.message,
                }
            }
            "progress" => StreamEvent::Progress(parse(kind, data)?),
            "field_chunk" | "item_chunk" | "challenge_chunk" => {
                let chunk: FieldChunk = parse(kind, data)?;
                if let Some(index) = chunk.item_index {
                    check_index(kind, index)?;
                }
                StreamEvent::FieldChunk(chunk)
            }
            "item_complete" | "challenge" => {
                let payload: ItemCompletePayload = parse(kind, data)?;
                let item_index = payload
                    .item_index
                    .or_else(|| payload.number.and_then(|n| n.checked_sub(1)).map(|n| n as usize))
                    .ok_or_else(|| StreamError::Decode {
                        kind: kind.to_string(),
                        source: serde_json::Error::custom("missing both item_index and number"),
                    })?;
                let item_index = check_index(kind, item_index)?;
                let number = payload
                    .number
                    .or_else(|| u32::try_from(item_index).ok().and_then(|n| n.checked_add(1)))
                    .unwrap_or_default();
                StreamEvent::ItemComplete(ItemComplete {
                    item_index,
                    number,
                    total: payload.total,
                    data: payload.data,
                })
            }
            "complete" => StreamEvent::Complete(parse(kind, data)?),
            "error" => {
                let payload: MessagePayload = parse(kind, data)?;
                let message = if payload.message.trim().is_empty() {
                    "The server reported an error".to_string()
                } else {
                    payload.message
                };
                StreamEvent::Error { message }
            }
            _ => return Ok(None),
        };

        Ok(Some(event))
    }

    /// Wire name of this event's kind
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Start { .. } => "start",
            StreamEvent::Progress(_) => "progress",
            StreamEvent::FieldChunk(_) => "field_chunk",
            StreamEvent::ItemComplete(_) => "item_complete",
            StreamEvent::Complete(_) => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Error { .. })
    }
}

fn parse<T: DeserializeOwned>(kind: &str, data: &str) -> Result<T, StreamError> {
    let data = if data.trim().is_empty() { "{}" } else { data };
    serde_json::from_str(data).map_err(|source| StreamError::Decode {
        kind: kind.to_string(),
        source,
    })
}

fn check_index(kind: &str, index: usize) -> Result<usize, StreamError> {
    if index < MAX_ITEMS {
        return Ok(index);
    }
    Err(StreamError::Decode {
        kind: kind.to_string(),
        source: serde_json::Error::custom(format!(
            "item_index {} out of range (max {})",
            index,
            MAX_ITEMS - 1
        )),
    })
}

// Backend sends ints but computes them from floats; tolerate both.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
