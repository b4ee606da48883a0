use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prompt::{ERROR_REPLY, RESET_GREETING, WELCOME_GREETING};
use crate::types::Role;

/// Id of the greeting the conversation starts with
pub const WELCOME_ID: &str = "welcome";

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    pub role: Role,
    /// May be empty when an image is attached
    pub text: String,
    /// `data:<mime>;base64,<payload>`, user messages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Set on the apology appended after a failed model call
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn with_id(id: String, role: Role, text: String) -> Self {
        Self {
            id,
            role,
            text,
            image_url: None,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>, image_url: Option<String>) -> Self {
        let mut message = Self::with_id(Uuid::new_v4().to_string(), Role::User, text.into());
        message.image_url = image_url;
        message
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), Role::Model, text.into())
    }

    /// Apology shown in place of a reply when the model call failed.
    pub fn error() -> Self {
        let mut message = Self::model(ERROR_REPLY);
        message.is_error = true;
        message
    }

    pub fn welcome() -> Self {
        Self::with_id(WELCOME_ID.to_string(), Role::Model, WELCOME_GREETING.to_string())
    }

    /// Greeting that replaces the history after a clear. Unlike the welcome
    /// it is an ordinary model turn.
    pub fn reset() -> Self {
        Self::model(RESET_GREETING)
    }

    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_ID
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Ordered message history. Append-only apart from [`Conversation::reset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Create a conversation holding only the welcome greeting
    pub fn new() -> Self {
        Self {
            messages: vec![Message::welcome()],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the whole history with a single reset greeting
    pub fn reset(&mut self) {
        self.messages = vec![Message::reset()];
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_holds_welcome() {
        let conversation = Conversation::new();

        assert_eq!(conversation.len(), 1);
        let welcome = &conversation.messages()[0];
        assert_eq!(welcome.id, WELCOME_ID);
        assert_eq!(welcome.role, Role::Model);
        assert!(welcome.is_welcome());
        assert!(!welcome.is_error);
    }

    #[test]
    fn test_reset_replaces_history() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("x^2 - 1 = 0", None));
        conversation.push(Message::model("$x = \\pm 1$"));

        conversation.reset();

        assert_eq!(conversation.len(), 1);
        let greeting = &conversation.messages()[0];
        assert_eq!(greeting.role, Role::Model);
        assert_eq!(greeting.text, RESET_GREETING);
        assert!(!greeting.is_welcome());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("a", None);
        let b = Message::user("a", None);

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_error_message_flags() {
        let message = Message::error();

        assert_eq!(message.role, Role::Model);
        assert!(message.is_error);
        assert!(!message.is_welcome());
        assert_eq!(message.text, ERROR_REPLY);
    }
}
