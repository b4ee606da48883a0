//! Conversation to Gemini `contents` mapping.
//!
//! Each retained message becomes one entry with its own role. Within an
//! entry the image part always comes before the text part.

use tracing::warn;

use crate::conversation::Message;
use crate::types::{Content, InlineImage, Part, Role};

/// A user message that has not been sent yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingMessage {
    pub text: String,
    /// `data:<mime>;base64,<payload>`
    pub image_url: Option<String>,
}

impl PendingMessage {
    pub fn new(text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            text: text.into(),
            image_url,
        }
    }

    /// Nothing to send: no image and no text beyond whitespace. The text
    /// itself is kept as typed.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image_url.is_none()
    }
}

/// Whether a stored message may be sent back to the model as history.
///
/// Error apologies and the welcome greeting are never replayed.
pub fn is_replayable(message: &Message) -> bool {
    !message.is_error && !message.is_welcome()
}

/// Split `data:<mime>;base64,<payload>` into media type and payload.
///
/// The media type is what sits between `:` and `;`, the payload is everything
/// after the first `,`.
pub fn parse_data_url(url: &str) -> Option<InlineImage> {
    let colon = url.find(':')?;
    let semicolon = colon + url[colon..].find(';')?;
    let comma = url.find(',')?;
    if comma < semicolon {
        return None;
    }

    Some(InlineImage {
        mime_type: url[colon + 1..semicolon].to_string(),
        data: url[comma + 1..].to_string(),
    })
}

/// Build one request entry. An entry with no text and no image gets an
/// empty parts list.
pub fn message_content(role: Role, text: &str, image_url: Option<&str>) -> Content {
    let mut parts = Vec::with_capacity(2);

    if let Some(url) = image_url {
        match parse_data_url(url) {
            Some(image) => parts.push(Part::inline_data(image)),
            None => warn!(role = role.as_str(), "Skipping image that is not a data URL"),
        }
    }

    if !text.is_empty() {
        parts.push(Part::text(text));
    }

    Content { role, parts }
}

/// Request entries for the stored history, replayable messages only
pub fn format_history(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .filter(|message| is_replayable(message))
        .map(|message| message_content(message.role, &message.text, message.image_url.as_deref()))
        .collect()
}

/// Final `user` entry for the message being sent
pub fn pending_content(pending: &PendingMessage) -> Content {
    message_content(Role::User, &pending.text, pending.image_url.as_deref())
}

/// Full `contents` array: retained history followed by the pending message.
///
/// Callers must not pass an empty pending message.
pub fn build_contents(messages: &[Message], pending: &PendingMessage) -> Vec<Content> {
    let mut contents = format_history(messages);
    contents.push(pending_content(pending));
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;

    const PNG_URL: &str = "data:image/png;base64,AAA";

    #[test]
    fn test_parse_data_url() {
        let image = parse_data_url(PNG_URL).unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "AAA");
        assert_eq!(image.to_data_url(), PNG_URL);
    }

    #[test]
    fn test_parse_data_url_rejects_malformed() {
        assert_eq!(parse_data_url("image/png;base64,AAA"), None);
        assert_eq!(parse_data_url("data:image/png,AAA"), None);
        assert_eq!(parse_data_url("data:image/png;base64"), None);
    }

    #[test]
    fn test_is_replayable() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hỏi", None));
        conversation.push(Message::error());
        conversation.push(Message::model("đáp"));

        let flags: Vec<bool> = conversation.messages().iter().map(is_replayable).collect();
        assert_eq!(flags, vec![false, true, false, true]);

        // The greeting left by a clear is a regular model turn
        conversation.reset();
        assert!(is_replayable(&conversation.messages()[0]));
    }

    #[test]
    fn test_entry_count_is_retained_plus_one() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("câu 1", None));
        conversation.push(Message::model("đáp 1"));
        conversation.push(Message::user("câu 2", Some(PNG_URL.to_string())));
        conversation.push(Message::error());

        let pending = PendingMessage::new("câu 3", None);
        let contents = build_contents(conversation.messages(), &pending);

        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0].role, Role::User);
        assert_eq!(contents[1].role, Role::Model);
        assert_eq!(contents[3], Content {
            role: Role::User,
            parts: vec![Part::text("câu 3")],
        });
    }

    #[test]
    fn test_image_part_precedes_text() {
        let content = message_content(Role::User, "Giải bài này", Some(PNG_URL));

        assert_eq!(content.parts.len(), 2);
        assert!(content.parts[0].is_image());
        assert_eq!(content.parts[1], Part::text("Giải bài này"));

        let pending = PendingMessage::new("", Some("data:image/jpeg;base64,/9j/".to_string()));
        let content = pending_content(&pending);
        assert_eq!(content.parts, vec![Part::inline_data(InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: "/9j/".to_string(),
        })]);
    }

    #[test]
    fn test_empty_entry_has_no_parts() {
        let content = message_content(Role::Model, "", None);

        assert_eq!(content.role, Role::Model);
        assert!(content.parts.is_empty());
    }

    #[test]
    fn test_malformed_image_is_skipped() {
        let content = message_content(Role::User, "đề bài", Some("not a data url"));

        assert_eq!(content.parts, vec![Part::text("đề bài")]);
    }

    #[test]
    fn test_pending_message_is_empty() {
        assert!(PendingMessage::default().is_empty());
        assert!(!PendingMessage::new("x", None).is_empty());
        assert!(PendingMessage::new(" \n ", None).is_empty());
        assert!(!PendingMessage::new("", Some(PNG_URL.to_string())).is_empty());
    }
}
