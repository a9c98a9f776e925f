//! NDJSON stream decoding
//!
//! The streaming endpoint answers with newline-delimited JSON: one event
//! object per line. Chunks arrive at arbitrary byte boundaries, so complete
//! lines are drained as they form and a partial tail is kept for the next
//! chunk. Blank lines and lines that fail to parse are expected noise and
//! are skipped without surfacing an error.

use serde_json::Value;
use tracing::{debug, trace};

/// Buffered line decoder turning raw response chunks into discrete events.
pub struct EventLineDecoder {
    /// Unconsumed bytes, at most one partial line after each `decode_chunk`
    buf: Vec<u8>,
    event_count: usize,
    bytes_received: usize,
}

impl EventLineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            event_count: 0,
            bytes_received: 0,
        }
    }

    /// Feed one chunk of response bytes, returning every event completed
    /// by it. Buffering is byte-level so multi-byte UTF-8 sequences split
    /// across chunks still decode.
    pub fn decode_chunk(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.bytes_received += chunk.len();
        self.buf.extend_from_slice(chunk);
        trace!(
            "NDJSON chunk: {} bytes (total: {} bytes)",
            chunk.len(),
            self.bytes_received
        );

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush the trailing unterminated line, if any, at end of stream.
    pub fn finish(&mut self) -> Option<Value> {
        let line = std::mem::take(&mut self.buf);
        let event = self.decode_line(&line);
        debug!(
            "NDJSON stream ended: {} events, {} bytes",
            self.event_count, self.bytes_received
        );
        event
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Value> {
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }

        match serde_json::from_slice::<Value>(line) {
            Ok(event) => {
                self.event_count += 1;
                trace!("NDJSON event #{}", self.event_count);
                Some(event)
            }
            Err(e) => {
                // Expected noise in a line-delimited stream; never fatal
                debug!("Skipping unparseable stream line: {}", e);
                None
            }
        }
    }
}

impl Default for EventLineDecoder {
    fn default() -> Self {
        Self::new()
    }
}
