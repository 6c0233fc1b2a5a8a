//! Core data types for the shared chat.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mailbox::markup;

/// Stable identity of a participant, used as the outbox key in the shared document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single chat message as stored in an outbox.
///
/// Field names on the wire follow the layout other clients of the shared
/// document already write (`user`, `message`, `description`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Creation instant in milliseconds since epoch; also the sort key
    pub id: i64,
    /// Display name or role label of the author
    #[serde(rename = "user")]
    pub sender: String,
    /// Plain text body
    #[serde(rename = "message")]
    pub body: String,
    /// Optional heading carried by some writers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Pre-rendered markup produced by the author
    #[serde(
        rename = "description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rendered_body: Option<String>,
}

impl Message {
    /// Create a plain message.
    pub fn new(id: i64, sender: &str, body: &str) -> Self {
        Self {
            id,
            sender: sender.to_string(),
            body: body.to_string(),
            title: None,
            rendered_body: None,
        }
    }

    /// Attach author-side rendered markup.
    pub fn with_rendered_body(mut self, rendered: String) -> Self {
        self.rendered_body = Some(rendered);
        self
    }

    /// Markup safe to hand to an HTML renderer.
    ///
    /// Always derived from the plain body on this client; remote
    /// `rendered_body` content is never passed through.
    pub fn safe_markup(&self) -> String {
        markup::render_markup(&self.body)
    }
}

/// Participant role as reported by the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Gm,
}

impl Role {
    /// Whether the role may broadcast-clear every outbox.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Gm)
    }
}

/// Standard API response wrapper for CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_names() {
        let message = Message::new(1000, "Alice", "hello");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["id"], 1000);
        assert_eq!(json["user"], "Alice");
        assert_eq!(json["message"], "hello");
        assert!(json.get("description").is_none());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_message_reads_optional_fields() {
        let json = r#"{"id":5,"user":"GM","message":"hi","title":"Omen","description":"<p>hi</p>"}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        assert_eq!(message.title.as_deref(), Some("Omen"));
        assert_eq!(message.rendered_body.as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn test_safe_markup_ignores_remote_markup() {
        let message = Message::new(1, "Mallory", "plain")
            .with_rendered_body("<script>alert(1)</script>".to_string());

        let markup = message.safe_markup();
        assert!(!markup.contains("<script>"));
        assert!(markup.contains("plain"));
    }

    #[test]
    fn test_role_privilege() {
        assert!(Role::Gm.is_privileged());
        assert!(!Role::Player.is_privileged());
        assert_eq!(serde_json::to_string(&Role::Gm).unwrap(), "\"gm\"");
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
