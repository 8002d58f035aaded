use jsonschema::JSONSchema;
use serde_json::{json, Value};

use crate::error::{RealtimeError, Result};
use crate::models::{EventKind, RealtimeEvent};

/// One `text/event-stream` message, before JSON decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// Longest line kept in memory. Anything longer is dropped up to its line end.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Incremental line parser for server-sent events. Chunks may split lines
/// (and UTF-8 sequences) anywhere. Lines end in `\n`, `\r\n` or a bare `\r`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    past_first_line: bool,
    overflowed: bool,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\r' => {
                    self.after_cr = true;
                    frames.extend(self.end_line());
                }
                b'\n' => frames.extend(self.end_line()),
                _ if self.overflowed => {}
                _ if self.line.len() >= MAX_LINE_BYTES => {
                    tracing::warn!(limit = MAX_LINE_BYTES, "event stream line too long, dropping it");
                    self.overflowed = true;
                    self.line = Vec::new();
                }
                _ => self.line.push(byte),
            }
        }
        frames
    }

    fn end_line(&mut self) -> Option<SseFrame> {
        let mut raw = std::mem::take(&mut self.line);
        if !std::mem::replace(&mut self.past_first_line, true) && raw.starts_with(BOM) {
            raw.drain(..BOM.len());
        }
        if std::mem::take(&mut self.overflowed) {
            return None;
        }
        let line = String::from_utf8_lossy(&raw).into_owned();
        self.process_line(&line)
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
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
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data, id })
    }
}

/// Validates frame payloads at the stream boundary and turns them into
/// [`RealtimeEvent`]s.
pub struct EventDecoder {
    schema: JSONSchema,
}

impl EventDecoder {
    pub fn new() -> Result<Self> {
        let schema = json!({
            "type": "object",
            "required": ["event"],
            "properties": {
                "event": {"type": "string", "minLength": 1},
                "channel": {"type": "string"},
                "data": {}
            }
        });
        let schema = JSONSchema::compile(&schema)
            .map_err(|e| RealtimeError::Config(format!("event schema: {}", e)))?;
        Ok(EventDecoder { schema })
    }

    /// `Ok(None)` for heartbeats, which carry nothing for subscribers.
    pub fn decode(&self, frame: &SseFrame) -> Result<Option<RealtimeEvent>> {
        if frame.event.as_deref() == Some(EventKind::Heartbeat.as_str()) {
            return Ok(None);
        }

        let mut value: Value = serde_json::from_str(&frame.data)?;
        if let (Value::Object(map), Some(name)) = (&mut value, frame.event.as_ref()) {
            if !map.contains_key("event") {
                map.insert("event".to_string(), Value::String(name.clone()));
            }
        }

        if let Err(errors) = self.schema.validate(&value) {
            let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(RealtimeError::Decode(message));
        }

        let event: RealtimeEvent = serde_json::from_value(value)?;
        if event.event == EventKind::Heartbeat {
            return Ok(None);
        }
        Ok(Some(event))
    }
}
