//! Display-update reduction over cumulative answer text
//!
//! Every stream event carries the assistant's *total* answer so far, not an
//! increment. The reducer turns that sequence into display updates, in one
//! of two modes depending on how the front end renders.

use serde::{Deserialize, Serialize};

/// Fixed answer used when a stream ends without producing any text.
pub const NO_TEXT_FALLBACK: &str = "No text response returned.";

/// How stream updates are shaped for the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Emit only the new text per event, for append-only displays
    /// (terminal-style incremental printing).
    Deltas,
    /// Emit the full cumulative answer at every event, for displays that
    /// redraw the whole message bubble.
    Snapshots,
}

/// Stateful reducer over one stream's cumulative answer texts.
///
/// In [`StreamMode::Deltas`], a text that extends the previous one by a
/// prefix yields just the remainder. A text that does *not* extend the
/// previous one (the agent replaced its answer instead of growing it) is
/// emitted in full as a fresh additive chunk - already-shown output is
/// never rewritten, even when the new answer supersedes it.
pub struct DeltaReducer {
    mode: StreamMode,
    last_text: String,
    final_text: String,
}

impl DeltaReducer {
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            last_text: String::new(),
            final_text: String::new(),
        }
    }

    /// Reduce the next cumulative answer to a display update.
    ///
    /// Only invoked for events that actually carried text. Returns `None`
    /// when there is nothing new to show for this event.
    pub fn push(&mut self, text: &str) -> Option<String> {
        let update = match self.mode {
            StreamMode::Snapshots => Some(text.to_string()),
            StreamMode::Deltas => {
                if let Some(remainder) = text.strip_prefix(self.last_text.as_str()) {
                    if remainder.is_empty() {
                        None
                    } else {
                        Some(remainder.to_string())
                    }
                } else {
                    Some(text.to_string())
                }
            }
        };

        self.last_text.clear();
        self.last_text.push_str(text);
        self.final_text.clear();
        self.final_text.push_str(text);

        update
    }

    /// Whether any event produced text so far.
    pub fn saw_text(&self) -> bool {
        !self.final_text.is_empty()
    }

    /// The final answer after the stream ended, or the fixed fallback when
    /// no event ever produced text.
    pub fn finish(self) -> String {
        if self.final_text.is_empty() {
            NO_TEXT_FALLBACK.to_string()
        } else {
            self.final_text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(mode: StreamMode, texts: &[&str]) -> Vec<String> {
        let mut reducer = DeltaReducer::new(mode);
        texts.iter().filter_map(|t| reducer.push(t)).collect()
    }

    #[test]
    fn test_deltas_growing_answer() {
        assert_eq!(
            reduce(StreamMode::Deltas, &["Hel", "Hello", "Hello world"]),
            vec!["Hel", "lo", " world"]
        );
    }

    #[test]
    fn test_deltas_replacement_emitted_in_full() {
        // Not a prefix extension - appended whole, never rewinding display
        assert_eq!(
            reduce(StreamMode::Deltas, &["Hello", "Goodbye"]),
            vec!["Hello", "Goodbye"]
        );
    }

    #[test]
    fn test_deltas_repeat_emits_nothing() {
        assert_eq!(reduce(StreamMode::Deltas, &["Hi", "Hi"]), vec!["Hi"]);
    }

    #[test]
    fn test_snapshots_always_full_text() {
        assert_eq!(
            reduce(StreamMode::Snapshots, &["Hel", "Hello", "Goodbye"]),
            vec!["Hel", "Hello", "Goodbye"]
        );
    }

    #[test]
    fn test_finish_returns_last_text() {
        let mut reducer = DeltaReducer::new(StreamMode::Deltas);
        reducer.push("Hel");
        reducer.push("Hello");
        assert!(reducer.saw_text());
        assert_eq!(reducer.finish(), "Hello");
    }

    #[test]
    fn test_finish_after_replacement_keeps_latest() {
        let mut reducer = DeltaReducer::new(StreamMode::Deltas);
        reducer.push("Hello");
        reducer.push("Goodbye");
        assert_eq!(reducer.finish(), "Goodbye");
    }

    #[test]
    fn test_empty_stream_falls_back() {
        let reducer = DeltaReducer::new(StreamMode::Deltas);
        assert!(!reducer.saw_text());
        assert_eq!(reducer.finish(), NO_TEXT_FALLBACK);
    }
}
