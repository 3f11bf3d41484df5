//! Wire types for the chat endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Configurable {
    pub thread_id: String,
}

/// Outbound request body. Only the newest user turn is sent; the server keeps
/// the thread history keyed by `thread_id`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub configurable: Configurable,
}

impl ChatRequest {
    pub fn for_user_turn(content: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: content.into(),
            }],
            configurable: Configurable {
                thread_id: thread_id.into(),
            },
        }
    }
}

/// Payload carried by a `data:` line of a non-terminal frame.
#[derive(Debug, Deserialize)]
pub struct DeltaPayload {
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_thread_id() {
        let request = ChatRequest::for_user_turn("Hello", "thread-1");
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [{ "role": "user", "content": "Hello" }],
                "configurable": { "thread_id": "thread-1" }
            })
        );
    }

    #[test]
    fn delta_payload_tolerates_missing_text() {
        let payload: DeltaPayload = serde_json::from_str(r#"{"other":1}"#).expect("parse");
        assert!(payload.text.is_none());
    }
}
