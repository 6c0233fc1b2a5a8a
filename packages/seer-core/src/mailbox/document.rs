//! Decoding and encoding of the chat namespace inside the shared document.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{CHAT_NAMESPACE_KEY, LAST_MODIFIED_KEY};
use crate::store::Metadata;
use crate::types::{Message, ParticipantId};
use crate::Result;

/// Every outbox in the shared document, keyed by participant identity.
///
/// Outboxes that fail to decode are carried through untouched so that a
/// write from this client never drops another participant's data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatDocument {
    outboxes: BTreeMap<ParticipantId, Vec<Message>>,
    unreadable: Map<String, Value>,
}

impl ChatDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the chat namespace from a raw shared document.
    ///
    /// A missing namespace key yields an empty document.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let Some(value) = metadata.get(CHAT_NAMESPACE_KEY) else {
            return Self::default();
        };

        let Some(entries) = value.as_object() else {
            tracing::warn!("Chat namespace is not an object; treating as empty");
            return Self::default();
        };

        let mut document = Self::default();
        for (key, outbox) in entries {
            match serde_json::from_value::<Vec<Message>>(outbox.clone()) {
                Ok(messages) => {
                    document.outboxes.insert(ParticipantId::new(key.as_str()), messages);
                }
                Err(err) => {
                    tracing::warn!("Skipping unreadable outbox {}: {}", key, err);
                    document.unreadable.insert(key.clone(), outbox.clone());
                }
            }
        }
        document
    }

    /// Build the partial document written back to the store.
    ///
    /// Carries the whole chat namespace plus the last-modified marker.
    pub fn to_patch(&self, modified_at: i64) -> Result<Metadata> {
        let mut namespace = self.unreadable.clone();
        for (identity, messages) in &self.outboxes {
            namespace.insert(identity.to_string(), serde_json::to_value(messages)?);
        }

        let mut patch = Metadata::new();
        patch.insert(CHAT_NAMESPACE_KEY.to_string(), Value::Object(namespace));
        patch.insert(LAST_MODIFIED_KEY.to_string(), Value::from(modified_at));
        Ok(patch)
    }

    /// Get one participant's outbox, if the key exists and decoded.
    pub fn outbox(&self, identity: &ParticipantId) -> Option<&[Message]> {
        self.outboxes.get(identity).map(Vec::as_slice)
    }

    /// Iterate decoded outboxes in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &[Message])> {
        self.outboxes.iter().map(|(id, messages)| (id, messages.as_slice()))
    }

    /// Every outbox key present, including unreadable ones.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let mut keys: Vec<ParticipantId> = self
            .outboxes
            .keys()
            .cloned()
            .chain(self.unreadable.keys().map(|k| ParticipantId::new(k.as_str())))
            .collect();
        keys.sort();
        keys
    }

    /// Number of outbox keys.
    pub fn len(&self) -> usize {
        self.outboxes.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total decoded messages across all outboxes.
    pub fn message_count(&self) -> usize {
        self.outboxes.values().map(Vec::len).sum()
    }

    /// Mutable access to an outbox, creating it on first use.
    ///
    /// An unreadable entry under the same key is discarded: the owner is the
    /// only writer of its outbox.
    pub(crate) fn outbox_mut(&mut self, identity: &ParticipantId) -> &mut Vec<Message> {
        self.unreadable.remove(identity.as_str());
        self.outboxes.entry(identity.clone()).or_default()
    }
}
