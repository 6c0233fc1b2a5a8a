//! The shared document store seam.
//!
//! The core only needs whole-document reads, top-level-key merges on write,
//! and change notifications. The host runtime that owns the real document
//! implements [`SharedDocumentStore`]; two implementations ship here.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::Result;

/// The raw shared document: top-level key to arbitrary JSON.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Computes a patch from the latest document inside [`SharedDocumentStore::update`].
pub type DocumentUpdate = Box<dyn FnOnce(&Metadata) -> Result<Metadata> + Send>;

/// Buffered notifications per subscriber before it is considered lagging.
pub(crate) const EVENT_CAPACITY: usize = 64;

/// Notification emitted by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The host session became ready (`true`) or went away (`false`)
    ReadyChanged(bool),
    /// Some participant wrote to the document
    DocumentChanged,
}

/// Key-value document shared by every participant.
#[async_trait]
pub trait SharedDocumentStore: Send + Sync {
    /// Whether a session (scene) is currently loaded.
    async fn is_ready(&self) -> bool;

    /// Read the full document.
    async fn get(&self) -> Result<Metadata>;

    /// Merge `patch` into the document, last write wins per top-level key.
    async fn set(&self, patch: Metadata) -> Result<()>;

    /// Read the latest document, build a patch from it and merge the patch,
    /// with no other write through this store in between.
    async fn update(&self, apply: DocumentUpdate) -> Result<()>;

    /// Start receiving change notifications.
    fn subscribe(&self) -> Subscription;
}

/// A live change subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<StoreEvent>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<StoreEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next event; `None` once the store is gone.
    ///
    /// A subscriber that fell behind gets a single `DocumentChanged` so it
    /// re-reads the whole document instead of replaying missed events.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Store subscriber lagged by {} events; resyncing", skipped);
                Some(StoreEvent::DocumentChanged)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {}
}
