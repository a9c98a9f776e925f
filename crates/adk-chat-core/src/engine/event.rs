//! Text extraction from decoded stream events
//!
//! Each event may carry the assistant's cumulative answer in
//! `content.parts[].text`. Everything else in the event is ignored.

use serde_json::Value;

/// Extract the cumulative answer text from one decoded event.
///
/// The event must have a `content` object with a `parts` array; the `text`
/// of every part that has a non-empty one is concatenated in part order.
/// Returns `None` when the event yields no text at all - callers must
/// distinguish "this event said nothing" from an empty-string answer.
pub fn extract_text(event: &Value) -> Option<String> {
    let parts = event.get("content")?.get("parts")?.as_array()?;

    let mut text = String::new();
    for part in parts {
        if let Some(fragment) = part.get("text").and_then(|t| t.as_str()) {
            if !fragment.is_empty() {
                text.push_str(fragment);
            }
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
