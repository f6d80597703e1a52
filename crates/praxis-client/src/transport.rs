//! SSE transport over reqwest

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tokio_util::sync::CancellationToken;

use praxis::ports::{RawRecord, RecordStream, RequestBody, StreamMethod, StreamRequest, StreamTransport};
use praxis::stream::SseDecoder;
use praxis::StreamError;

use crate::config::ClientConfig;
use crate::error::{api_message, ClientError};

/// Opens `text/event-stream` requests and frames the body into records
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        // No overall timeout: analyses stream for minutes.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    fn build(&self, request: StreamRequest) -> Result<RequestBuilder, StreamError> {
        let url = self.config.url(&request.path);
        let builder = match request.method {
            StreamMethod::Get => self.client.get(&url),
            StreamMethod::Post => self.client.post(&url),
        };
        let builder = self
            .authorize(builder)
            .header(ACCEPT, "text/event-stream");

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart { file, fields } => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(|e| StreamError::Transport(format!("invalid attachment type: {e}")))?;
                let form = fields
                    .into_iter()
                    .fold(Form::new().part("file", part), |form, (name, value)| form.text(name, value));
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

struct Framing {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    ready: VecDeque<RawRecord>,
    cancel: CancellationToken,
    finished: bool,
}

impl Framing {
    async fn next_record(mut self) -> Option<(Result<RawRecord, StreamError>, Self)> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Some(record) = self.ready.pop_front() {
                return Some((Ok(record), self));
            }
            if self.finished {
                return None;
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                chunk = self.body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => match self.decoder.push(&bytes) {
                    Ok(records) => self.ready.extend(records),
                    Err(e) => {
                        self.finished = true;
                        return Some((Err(e), self));
                    }
                },
                Some(Err(e)) => {
                    self.finished = true;
                    return Some((Err(StreamError::Transport(e.to_string())), self));
                }
                None => {
                    self.finished = true;
                    match self.decoder.finish() {
                        Ok(trailing) => self.ready.extend(trailing),
                        Err(e) => return Some((Err(e), self)),
                    }
                }
            }
        }
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<RecordStream, StreamError> {
        let path = request.path.clone();
        let builder = self.build(request)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(StreamError::Transport("request cancelled".to_string()));
            }
            response = builder.send() => {
                response.map_err(|e| StreamError::Transport(e.to_string()))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(StreamError::Transport("request cancelled".to_string()));
                }
                body = response.text() => body.unwrap_or_default(),
            };
            tracing::warn!(path = %path, status = status.as_u16(), "Stream request rejected");
            return Err(StreamError::Status {
                status: status.as_u16(),
                body: api_message(&body),
            });
        }

        tracing::debug!(path = %path, status = status.as_u16(), "Stream opened");

        let framing = Framing {
            body: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            cancel,
            finished: false,
        };

        Ok(futures::stream::unfold(framing, Framing::next_record).boxed())
    }

    fn name(&self) -> &str {
        "http"
    }
}
