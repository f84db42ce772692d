//! Incremental decoder for `data:`-framed chat completion streams
//!
//! Bytes are buffered across chunks and only complete lines are decoded, so a
//! record or a multi-byte character split by the transport is reassembled
//! before it is parsed.

use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of decoding stream input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// Newly produced assistant text
    Token(String),
    /// No further tokens will follow
    Done,
    /// The line carried nothing for the consumer
    Ignored,
}

#[derive(Deserialize, Debug)]
struct StreamRecord {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    // Some servers send an explicit `null` delta on the final record.
    #[serde(default)]
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Stateful frame decoder for one logical stream
#[derive(Debug, Default)]
pub struct StreamFrameParser {
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to hold no newline
    scanned: usize,
    terminal: bool,
}

impl StreamFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal event has been emitted
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Bytes of the trailing partial line still waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one transport chunk and collect the events of every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        if self.terminal || chunk.is_empty() {
            return events;
        }

        self.buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let line = trim_line_ending(&self.buffer[consumed..end]);
            consumed = end + 1;
            search_from = consumed;

            if Self::push_line_events(line, &mut events) {
                self.terminal = true;
                self.buffer.clear();
                self.scanned = 0;
                return events;
            }
        }
        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();

        events
    }

    /// Flush the trailing unterminated line once the transport has closed.
    pub fn finish(&mut self) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        if self.terminal || self.buffer.is_empty() {
            return events;
        }

        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if Self::push_line_events(trim_line_ending(&rest), &mut events) {
            self.terminal = true;
        }
        events
    }

    /// Returns true once the line has terminated the stream.
    fn push_line_events(line: &[u8], events: &mut Vec<ParseEvent>) -> bool {
        let Ok(line) = std::str::from_utf8(line) else {
            tracing::trace!(len = line.len(), "Dropping stream line with invalid UTF-8");
            return false;
        };

        for event in Self::parse_line(line) {
            match event {
                ParseEvent::Ignored => {}
                ParseEvent::Done => {
                    events.push(ParseEvent::Done);
                    return true;
                }
                token => events.push(token),
            }
        }
        false
    }

    /// Classify a single decoded line.
    ///
    /// Lines that yield nothing for the consumer (non-data lines, unparsable
    /// records, records without content or finish reason) return `[Ignored]`.
    pub fn parse_line(line: &str) -> Vec<ParseEvent> {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return vec![ParseEvent::Ignored];
        };

        if payload == DONE_SENTINEL {
            return vec![ParseEvent::Done];
        }

        let record: StreamRecord = match serde_json::from_str(payload) {
            Ok(record) => record,
            Err(e) => {
                // Truncated records are expected mid-stream.
                tracing::trace!(error = %e, "Dropping unparsable stream record");
                return vec![ParseEvent::Ignored];
            }
        };

        let Some(choice) = record.choices.into_iter().next() else {
            return vec![ParseEvent::Ignored];
        };

        let mut events = Vec::with_capacity(2);
        if let Some(content) = choice.delta.and_then(|delta| delta.content) {
            events.push(ParseEvent::Token(content));
        }
        if choice.finish_reason.is_some() {
            events.push(ParseEvent::Done);
        }
        if events.is_empty() {
            events.push(ParseEvent::Ignored);
        }
        events
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
