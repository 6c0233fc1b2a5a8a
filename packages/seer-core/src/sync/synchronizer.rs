//! Keeps a locally published timeline in step with the shared document.

use std::sync::Arc;

use crate::mailbox::{build_timeline, extract_outbox, ChatDocument};
use crate::store::{SharedDocumentStore, StoreEvent, Subscription};
use crate::types::{Message, ParticipantId};
use crate::{Error, Result};

/// Outcome of processing one store notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncUpdate {
    /// The rebuilt timeline had the same length; nothing was republished
    Unchanged,
    /// The session became ready and its timeline was published
    Ready { len: usize },
    /// A timeline of different length replaced the published one
    Republished { previous_len: usize, len: usize },
    /// The session went away and the local timeline was discarded
    Unready,
}

impl SyncUpdate {
    /// Whether the published timeline got longer.
    pub fn is_growth(&self) -> bool {
        match *self {
            SyncUpdate::Ready { len } => len > 0,
            SyncUpdate::Republished { previous_len, len } => len > previous_len,
            SyncUpdate::Unchanged | SyncUpdate::Unready => false,
        }
    }

    /// Whether the view should jump to the newest message.
    pub fn scrolls_to_latest(&self) -> bool {
        matches!(
            self,
            SyncUpdate::Ready { .. } | SyncUpdate::Republished { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Published {
    timeline: Vec<Message>,
    own_outbox: Vec<Message>,
}

/// Rebuilds and republishes the merged timeline whenever the store changes.
///
/// Change detection compares timeline lengths only. Two edits that leave the
/// total message count unchanged are not republished.
pub struct TimelineSynchronizer {
    store: Arc<dyn SharedDocumentStore>,
    identity: ParticipantId,
    subscription: Subscription,
    published: Option<Published>,
}

impl TimelineSynchronizer {
    /// Subscribe to `store`. Starts unready; call [`refresh`](Self::refresh)
    /// or wait on [`next_update`](Self::next_update).
    pub fn new(store: Arc<dyn SharedDocumentStore>, identity: ParticipantId) -> Self {
        let subscription = store.subscribe();
        Self {
            store,
            identity,
            subscription,
            published: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.published.is_some()
    }

    /// The published timeline; empty while unready.
    pub fn timeline(&self) -> &[Message] {
        self.published
            .as_ref()
            .map(|p| p.timeline.as_slice())
            .unwrap_or_default()
    }

    /// This participant's outbox as of the last publish.
    pub fn own_outbox(&self) -> &[Message] {
        self.published
            .as_ref()
            .map(|p| p.own_outbox.as_slice())
            .unwrap_or_default()
    }

    /// Fetch the document and republish if the timeline length changed.
    pub async fn refresh(&mut self) -> Result<SyncUpdate> {
        if !self.store.is_ready().await {
            return Ok(self.discard());
        }

        let metadata = match self.store.get().await {
            Ok(metadata) => metadata,
            Err(Error::SessionNotReady) => return Ok(self.discard()),
            Err(err) => return Err(err),
        };

        let document = ChatDocument::from_metadata(&metadata);
        let timeline = build_timeline(&document);
        let own_outbox = extract_outbox(&document, &self.identity);

        let update = match self.published.as_mut() {
            None => {
                let len = timeline.len();
                self.published = Some(Published {
                    timeline,
                    own_outbox,
                });
                tracing::info!("Session ready with {} messages", len);
                SyncUpdate::Ready { len }
            }
            Some(published) => {
                published.own_outbox = own_outbox;
                let previous_len = published.timeline.len();
                if previous_len == timeline.len() {
                    SyncUpdate::Unchanged
                } else {
                    let len = timeline.len();
                    published.timeline = timeline;
                    tracing::debug!("Timeline republished: {} -> {}", previous_len, len);
                    SyncUpdate::Republished { previous_len, len }
                }
            }
        };

        Ok(update)
    }

    /// Apply one store notification.
    pub async fn handle_event(&mut self, event: StoreEvent) -> Result<SyncUpdate> {
        match event {
            StoreEvent::ReadyChanged(false) => Ok(self.discard()),
            StoreEvent::ReadyChanged(true) | StoreEvent::DocumentChanged => self.refresh().await,
        }
    }

    /// Wait for the next store notification without applying it.
    ///
    /// Cancel safe, so it can sit in a `select!` next to other sources.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        self.subscription.recv().await
    }

    /// Wait for the next store notification and apply it.
    ///
    /// Returns `Ok(None)` once the store has shut down.
    pub async fn next_update(&mut self) -> Result<Option<SyncUpdate>> {
        let Some(event) = self.next_event().await else {
            return Ok(None);
        };
        self.handle_event(event).await.map(Some)
    }

    /// Drop the subscription and the published timeline.
    pub fn shutdown(self) {
        self.subscription.unsubscribe();
    }

    fn discard(&mut self) -> SyncUpdate {
        if self.published.take().is_some() {
            tracing::info!("Session no longer ready; timeline discarded");
            SyncUpdate::Unready
        } else {
            SyncUpdate::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{append_message, CHAT_NAMESPACE_KEY};
    use crate::store::{Metadata, MemoryStore};

    fn document_with(messages: &[(&str, i64, &str)]) -> Metadata {
        let mut document = ChatDocument::new();
        for (identity, id, body) in messages {
            document = append_message(
                &document,
                &ParticipantId::from(*identity),
                Message::new(*id, identity, body),
            );
        }
        document.to_patch(0).unwrap()
    }

    fn synchronizer(store: &Arc<MemoryStore>) -> TimelineSynchronizer {
        TimelineSynchronizer::new(store.clone(), "p1".into())
    }

    #[tokio::test]
    async fn test_starts_unready() {
        let store = Arc::new(MemoryStore::new());
        let sync = synchronizer(&store);

        assert!(!sync.is_ready());
        assert!(sync.timeline().is_empty());
    }

    #[tokio::test]
    async fn test_first_refresh_publishes() {
        let store = Arc::new(MemoryStore::with_document(document_with(&[
            ("p1", 2000, "b"),
            ("p2", 1000, "a"),
        ])));
        let mut sync = synchronizer(&store);

        let update = sync.refresh().await.unwrap();

        assert_eq!(update, SyncUpdate::Ready { len: 2 });
        assert!(update.is_growth());
        assert!(update.scrolls_to_latest());
        assert_eq!(sync.timeline()[0].body, "a");
        assert_eq!(sync.own_outbox().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_session_ready_is_not_growth() {
        let store = Arc::new(MemoryStore::new());
        let mut sync = synchronizer(&store);

        let update = sync.refresh().await.unwrap();
        assert_eq!(update, SyncUpdate::Ready { len: 0 });
        assert!(!update.is_growth());
        assert!(sync.is_ready());
    }

    #[tokio::test]
    async fn test_change_notification_republishes() {
        let store = Arc::new(MemoryStore::new());
        let mut sync = synchronizer(&store);
        sync.refresh().await.unwrap();

        store.set(document_with(&[("p2", 1000, "hi")])).await.unwrap();
        let update = sync.next_update().await.unwrap();

        assert_eq!(
            update,
            Some(SyncUpdate::Republished {
                previous_len: 0,
                len: 1
            })
        );
        assert_eq!(sync.timeline().len(), 1);
    }

    #[tokio::test]
    async fn test_same_length_edit_is_not_republished() {
        let store = Arc::new(MemoryStore::with_document(document_with(&[("p2", 1000, "old")])));
        let mut sync = synchronizer(&store);
        sync.refresh().await.unwrap();

        store.set(document_with(&[("p2", 1000, "edited")])).await.unwrap();
        let update = sync.next_update().await.unwrap();

        assert_eq!(update, Some(SyncUpdate::Unchanged));
        assert_eq!(sync.timeline()[0].body, "old");
    }

    #[tokio::test]
    async fn test_clear_republishes_shrink() {
        let store = Arc::new(MemoryStore::with_document(document_with(&[
            ("p1", 1, "a"),
            ("p2", 2, "b"),
        ])));
        let mut sync = synchronizer(&store);
        sync.refresh().await.unwrap();

        let mut cleared = Metadata::new();
        cleared.insert(
            CHAT_NAMESPACE_KEY.to_string(),
            serde_json::json!({ "p1": [], "p2": [] }),
        );
        store.set(cleared).await.unwrap();

        let update = sync.next_update().await.unwrap().unwrap();
        assert_eq!(update, SyncUpdate::Republished { previous_len: 2, len: 0 });
        assert!(!update.is_growth());
        assert!(sync.timeline().is_empty());
    }

    #[tokio::test]
    async fn test_unready_discards_and_recovers() {
        let store = Arc::new(MemoryStore::with_document(document_with(&[("p2", 1, "a")])));
        let mut sync = synchronizer(&store);
        sync.refresh().await.unwrap();

        store.set_ready(false);
        assert_eq!(sync.next_update().await.unwrap(), Some(SyncUpdate::Unready));
        assert!(!sync.is_ready());
        assert!(sync.timeline().is_empty());

        store.set_ready(true);
        assert_eq!(
            sync.next_update().await.unwrap(),
            Some(SyncUpdate::Ready { len: 1 })
        );
    }

    #[tokio::test]
    async fn test_refresh_while_unready_store() {
        let store = Arc::new(MemoryStore::new());
        store.set_ready(false);
        let mut sync = synchronizer(&store);

        assert_eq!(sync.refresh().await.unwrap(), SyncUpdate::Unchanged);
        assert!(!sync.is_ready());
    }

    #[tokio::test]
    async fn test_missing_namespace_is_empty_timeline() {
        let mut other = Metadata::new();
        other.insert("unrelated".to_string(), serde_json::json!(true));
        let store = Arc::new(MemoryStore::with_document(other));
        let mut sync = synchronizer(&store);

        assert_eq!(sync.refresh().await.unwrap(), SyncUpdate::Ready { len: 0 });
    }
}
