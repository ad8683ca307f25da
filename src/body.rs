//! Conversation payload types exchanged with the host runtime.
//!
//! The host hands the pipe a JSON request body carrying an ordered message
//! sequence. The sequence is never reordered or truncated here, only
//! appended to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// Human user message.
    User,
    /// Assistant (LLM) message.
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,
    /// Plain-text message content.
    pub content: String,
}

impl ChatMessage {
    /// Convenience constructor for an assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The request body handed to the pipe by the host.
///
/// Unknown host fields (model name, stream flag, chat id, ...) are preserved
/// verbatim in `extra` so the mutated body round-trips unchanged apart from
/// the appended reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Ordered conversation messages.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Host fields this pipe does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RequestBody {
    /// Content of the most recent message, if any.
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }

    /// Append an assistant reply to the message sequence.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }
}

/// The requesting user as supplied by the host, when it supplies one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    /// Host-side user identifier.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Account email.
    pub email: Option<String>,
    /// Host role string (e.g. "admin", "user").
    pub role: Option<String>,
}

/// What the pipe returns to the host: the mutated body, or an error record.
///
/// Serializes either as the body object itself or as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipeOutput {
    /// The request body with the reply appended.
    Body(RequestBody),
    /// Invocation failure surfaced to the host.
    Error {
        /// Human-readable failure description.
        error: String,
    },
}

impl PipeOutput {
    /// Whether this output is the error record shape.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_roundtrip_preserves_unknown_fields() {
        let raw = json!({
            "model": "chain_pipe",
            "stream": false,
            "messages": [{"role": "user", "content": "hello"}]
        });
        let body: RequestBody = serde_json::from_value(raw.clone()).expect("should parse");
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.extra.get("model"), Some(&json!("chain_pipe")));
        let back = serde_json::to_value(&body).expect("should serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn test_push_assistant_appends_only() {
        let mut body: RequestBody =
            serde_json::from_value(json!({"messages": [{"role": "user", "content": "hi"}]}))
                .expect("should parse");
        body.push_assistant("hello back");
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].content, "hi");
        assert_eq!(body.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_error_output_shape() {
        let out = PipeOutput::Error {
            error: "boom".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&out).expect("should serialize"),
            json!({"error": "boom"})
        );
    }

    #[test]
    fn test_missing_messages_key_parses_empty() {
        let body: RequestBody = serde_json::from_value(json!({})).expect("should parse");
        assert!(body.messages.is_empty());
        assert!(body.last_content().is_none());
    }
}
