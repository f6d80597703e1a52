//! SSE framing
//!
//! Incremental decoder for the backend's `event:`/`data:` framing. Network
//! chunks may split lines (and multi-byte UTF-8 sequences) anywhere, so
//! bytes are buffered until a full line is available.

use crate::domain::errors::StreamError;
use crate::ports::RawRecord;

/// Kind used when a record declares neither `event:` nor a `type` field
pub const DEFAULT_KIND: &str = "message";

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk, returning every record it completed
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<RawRecord>, StreamError> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = std::str::from_utf8(line)
                .map_err(|e| StreamError::Framing(format!("invalid UTF-8 in stream: {e}")))?;

            if let Some(record) = self.process_line(line) {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// End of input: dispatch whatever is pending even without the final
    /// blank line.
    pub fn finish(&mut self) -> Result<Option<RawRecord>, StreamError> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = rest.strip_suffix(b"\r").unwrap_or(&rest);
            let line = std::str::from_utf8(rest)
                .map_err(|e| StreamError::Framing(format!("invalid UTF-8 in stream: {e}")))?;
            if let Some(record) = self.process_line(line) {
                return Ok(Some(record));
            }
        }
        Ok(self.dispatch())
    }

    fn process_line(&mut self, line: &str) -> Option<RawRecord> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry carry nothing we use
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<RawRecord> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");

        let kind = event
            .filter(|e| !e.is_empty())
            .or_else(|| kind_from_payload(&data))
            .unwrap_or_else(|| DEFAULT_KIND.to_string());

        Some(RawRecord { kind, data })
    }
}

fn kind_from_payload(data: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    value.get("type")?.as_str().map(str::to_string)
}

/// Decode a complete SSE capture in one go
pub fn decode_all(bytes: &[u8]) -> Result<Vec<RawRecord>, StreamError> {
    let mut decoder = SseDecoder::new();
    let mut records = decoder.push(bytes)?;
    records.extend(decoder.finish()?);
    Ok(records)
}
