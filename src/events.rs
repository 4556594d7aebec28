//! Streaming event model for chat responses.
//!
//! The tutor engine emits [`ChatEvent`]s that abstract over the upstream
//! chat-completions stream and render directly as Server-Sent Events for
//! the client.
//!
//! # Example
//!
//! ```rust
//! use nuanswers::events::{ChatEvent, sse_event};
//!
//! let event = ChatEvent::MessageDelta {
//!     text: "Hello".to_string(),
//! };
//! let sse = sse_event(&event);
//! assert!(sse.contains("message.delta"));
//! ```

use serde::{Deserialize, Serialize};

/// Streaming events emitted by the tutor engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// Indicates the start of a new streaming response.
    #[serde(rename = "stream.start")]
    StreamStart {
        /// Unique identifier for this request/response pair.
        request_id: String,
    },

    /// Incremental text delta from the assistant's response.
    #[serde(rename = "message.delta")]
    MessageDelta {
        /// The text fragment to append.
        text: String,
    },

    /// An error occurred during streaming.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        message: String,
        /// Optional error code for programmatic handling.
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream has completed successfully.
    #[serde(rename = "done")]
    Done,
}

/// Convert a [`ChatEvent`] to an SSE-formatted string.
///
/// The output follows the Server-Sent Events specification with both
/// an `event:` line (for EventSource listeners) and a `data:` line
/// containing the JSON payload.
pub fn sse_event(evt: &ChatEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "data": { "message": e.to_string() } }).to_string()
    });

    format!("event: {}\ndata: {json}\n\n", event_name(evt))
}

/// Get the SSE event name for a [`ChatEvent`].
#[must_use]
pub fn event_name(evt: &ChatEvent) -> &'static str {
    match evt {
        ChatEvent::StreamStart { .. } => "stream.start",
        ChatEvent::MessageDelta { .. } => "message.delta",
        ChatEvent::Error { .. } => "error",
        ChatEvent::Done => "done",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_delta_serialization() {
        let event = ChatEvent::MessageDelta {
            text: "Hello".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("message.delta"));
        assert!(json.contains("Hello"));
    }

    #[test]
    fn test_sse_event_format() {
        let event = ChatEvent::Done;
        let sse = sse_event(&event);
        assert!(sse.starts_with("event: done\n"));
        assert!(sse.contains("data: "));
        assert!(sse.ends_with("\n\n"));
    }

    #[test]
    fn test_error_event_carries_code() {
        let event = ChatEvent::Error {
            message: "upstream failed".to_string(),
            code: Some("UPSTREAM".to_string()),
        };
        let sse = sse_event(&event);
        assert!(sse.starts_with("event: error\n"));
        assert!(sse.contains("UPSTREAM"));
    }

    #[test]
    fn test_roundtrip() {
        let event = ChatEvent::StreamStart {
            request_id: "req-123".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
