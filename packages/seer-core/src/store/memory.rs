//! In-process store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::{DocumentUpdate, Metadata, SharedDocumentStore, StoreEvent, Subscription, EVENT_CAPACITY};
use crate::{Error, Result};

/// A shared document held in memory, ready by default.
#[derive(Debug)]
pub struct MemoryStore {
    document: Mutex<Metadata>,
    ready: AtomicBool,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_document(Metadata::new())
    }

    /// Start from an existing document.
    pub fn with_document(document: Metadata) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            document: Mutex::new(document),
            ready: AtomicBool::new(true),
            events,
        }
    }

    /// Simulate the host session loading or unloading.
    pub fn set_ready(&self, ready: bool) {
        if self.ready.swap(ready, Ordering::SeqCst) != ready {
            let _ = self.events.send(StoreEvent::ReadyChanged(ready));
        }
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> Metadata {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedDocumentStore for MemoryStore {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn get(&self) -> Result<Metadata> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(Error::SessionNotReady);
        }
        let document = self
            .document
            .lock()
            .map_err(|_| Error::Store("document lock poisoned".to_string()))?;
        Ok(document.clone())
    }

    async fn set(&self, patch: Metadata) -> Result<()> {
        self.update(Box::new(move |_: &Metadata| Ok(patch))).await
    }

    async fn update(&self, apply: DocumentUpdate) -> Result<()> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(Error::SessionNotReady);
        }
        {
            let mut document = self
                .document
                .lock()
                .map_err(|_| Error::Store("document lock poisoned".to_string()))?;
            let patch = apply(&document)?;
            for (key, value) in patch {
                document.insert(key, value);
            }
        }
        let _ = self.events.send(StoreEvent::DocumentChanged);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.events.subscribe())
    }
}
