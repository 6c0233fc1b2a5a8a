//! Pure functions over the chat document.

use super::document::ChatDocument;
use crate::types::{Message, ParticipantId};

/// Append `message` to `author`'s outbox, returning the new document.
///
/// Other outboxes are untouched. A message whose body is blank after
/// trimming leaves the document unchanged.
pub fn append_message(
    document: &ChatDocument,
    author: &ParticipantId,
    message: Message,
) -> ChatDocument {
    if message.body.trim().is_empty() {
        return document.clone();
    }

    let mut next = document.clone();
    next.outbox_mut(author).push(message);
    next
}

/// Empty every outbox while keeping its key.
pub fn clear_all(document: &ChatDocument) -> ChatDocument {
    let mut cleared = ChatDocument::new();
    for identity in document.participants() {
        cleared.outbox_mut(&identity);
    }
    cleared
}

/// Merge all outboxes into one timeline, ascending by id.
///
/// Outboxes are visited in identity order and the sort is stable, so equal
/// ids fall back to identity order and then to position within the outbox.
pub fn build_timeline(document: &ChatDocument) -> Vec<Message> {
    let mut timeline: Vec<Message> = document
        .iter()
        .flat_map(|(_, messages)| messages.iter().cloned())
        .collect();
    timeline.sort_by_key(|message| message.id);
    timeline
}

/// The raw outbox of one participant; empty if the key is absent.
pub fn extract_outbox(document: &ChatDocument, identity: &ParticipantId) -> Vec<Message> {
    document
        .outbox(identity)
        .map(<[Message]>::to_vec)
        .unwrap_or_default()
}
