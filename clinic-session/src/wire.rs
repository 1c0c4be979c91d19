//! Wire encoding and decoding for the assistant chat protocol.
//!
//! The server speaks a loose protocol: outbound messages are small JSON
//! objects, inbound frames may be JSON objects, bare JSON strings, or plain
//! text. Decoding therefore never fails; anything unrecognized is displayed
//! literally.

use serde_json::{json, Value};

/// Keep-alive probe the server sends periodically.
pub const KEEP_ALIVE_PROBE: &str = "ping";

/// Reply sent for every probe; the server discards it.
pub const KEEP_ALIVE_REPLY: &str = "pong";

/// Opening line the assistant sends once per connection. Subject to
/// duplicate suppression by [`crate::types::GreetingGuard`].
pub const INITIAL_GREETING: &str =
    "Hi! I’m here to help you book an appointment. What’s your name?";

/// One inbound frame after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// The keep-alive probe; answered, never displayed.
    KeepAlive,
    /// Display text for a remote turn.
    Text(String),
}

/// Two-tier decode of a raw inbound frame.
///
/// A JSON object yields its `text` field, falling back to its `message`
/// field; a bare JSON string yields itself. Anything else, including invalid
/// JSON and objects without a recognized field, degrades to the literal
/// frame text. Frames are never dropped at this stage.
pub fn decode_frame(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| map.get("message").and_then(Value::as_str))
            .map_or_else(|| raw.to_owned(), str::to_owned),
        Ok(Value::String(s)) => s,
        _ => raw.to_owned(),
    }
}

/// Decode and classify one raw frame.
///
/// The probe comparison runs on the decoded text, so `"ping"` is recognized
/// as a bare JSON string, as a `text`/`message` field value, or as the raw
/// literal.
pub fn classify_frame(raw: &str) -> InboundFrame {
    let text = decode_frame(raw);
    if text == KEEP_ALIVE_PROBE {
        InboundFrame::KeepAlive
    } else {
        InboundFrame::Text(text)
    }
}

/// Encode an outbound chat message.
pub fn encode_text(text: &str) -> String {
    json!({ "text": text }).to_string()
}

/// Encode the reschedule control signal.
pub fn encode_reschedule() -> String {
    json!({ "action": "reschedule" }).to_string()
}
