//! Stream Transport Port
//!
//! Opens a long-lived request against the backend and exposes the response
//! body as discrete typed records.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::errors::StreamError;

/// One framed record: the declared kind plus its raw JSON payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: String,
    pub data: String,
}

impl RawRecord {
    pub fn new(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }

    /// Build a record from a JSON payload
    pub fn json(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self::new(kind, data.to_string())
    }
}

/// Records as they come off the wire. An `Err` item ends the stream.
pub type RecordStream = BoxStream<'static, Result<RawRecord, StreamError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamMethod {
    Get,
    Post,
}

/// A file sent along with a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart {
        file: FileAttachment,
        fields: Vec<(String, String)>,
    },
}

/// Request descriptor handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub method: StreamMethod,
    /// Path relative to the transport's base URL
    pub path: String,
    pub body: RequestBody,
}

impl StreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: StreamMethod::Get,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: StreamMethod::Post,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_file(mut self, file: FileAttachment, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Multipart { file, fields };
        self
    }
}

/// Stream transport interface
///
/// Implementations must stop yielding records once `cancel` fires and must
/// report every failure (refused connection, non-2xx status, broken framing)
/// through the returned `Result`s rather than panicking.
///
/// # Example
///
/// ```rust,ignore
/// use praxis::ports::StreamTransport;
///
/// struct HttpTransport { /* ... */ }
///
/// #[async_trait]
/// impl StreamTransport for HttpTransport {
///     async fn open(&self, request: StreamRequest, cancel: CancellationToken)
///         -> Result<RecordStream, StreamError> {
///         // send the request, frame the body as SSE
///     }
/// }
/// ```
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<RecordStream, StreamError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "transport"
    }
}
