//! JSON-file store shared by every client on one machine.

use async_trait::async_trait;
use std::env;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use super::{DocumentUpdate, Metadata, SharedDocumentStore, StoreEvent, Subscription, EVENT_CAPACITY};
use crate::{Error, Result};

/// Shared document persisted as one JSON object on disk.
///
/// Writes by this instance notify subscribers immediately; writes by other
/// processes are picked up by [`FileStore::poll`] (or the task started by
/// [`FileStore::watch`]). A file that cannot be read or parsed counts as
/// "no session" until it becomes readable again.
///
/// Updates through one instance are serialized. Separate instances on the
/// same file (other processes included) each replace the file atomically, but
/// their read-modify-write cycles may still interleave.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<PollState>,
    events: broadcast::Sender<StoreEvent>,
}

#[derive(Debug)]
struct PollState {
    last_seen: Option<String>,
    ready: bool,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            path: path.into(),
            state: Mutex::new(PollState {
                last_seen: None,
                ready: true,
            }),
            events,
        }
    }

    /// Get the default document path.
    ///
    /// Default path: `~/.seer/scene.json`
    /// Can be overridden with `SEER_DOCUMENT_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SEER_DOCUMENT_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".seer/scene.json"))
            .unwrap_or_else(|| PathBuf::from("scene.json"))
    }

    /// Get the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; `None` when the file does not exist yet.
    async fn read_raw(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn parse(raw: Option<&str>) -> Result<Metadata> {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
            _ => Ok(Metadata::new()),
        }
    }

    async fn read_document(&self) -> Result<(Metadata, Option<String>)> {
        let raw = self.read_raw().await?;
        let document = Self::parse(raw.as_deref())?;
        Ok((document, raw))
    }

    /// Replace the file through a uniquely named sibling temp file.
    async fn write_raw(&self, raw: String) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&parent)?;

            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(raw.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|err| err.error)?;
            Ok(())
        })
        .await
        .map_err(|err| Error::Store(format!("write task failed: {}", err)))?
    }

    /// Re-read the file and emit events for anything that changed since the
    /// last look. Returns whether an event was emitted.
    pub async fn poll(&self) -> bool {
        let outcome = self.read_document().await;
        let mut state = self.state.lock().await;

        match outcome {
            Ok((_, raw)) => {
                if !state.ready {
                    state.ready = true;
                    state.last_seen = raw;
                    tracing::info!("Document {} readable again", self.path.display());
                    let _ = self.events.send(StoreEvent::ReadyChanged(true));
                    return true;
                }
                if raw != state.last_seen {
                    state.last_seen = raw;
                    tracing::debug!("Document {} changed on disk", self.path.display());
                    let _ = self.events.send(StoreEvent::DocumentChanged);
                    return true;
                }
                false
            }
            Err(err) => {
                if state.ready {
                    state.ready = false;
                    tracing::warn!("Document {} unavailable: {}", self.path.display(), err);
                    let _ = self.events.send(StoreEvent::ReadyChanged(false));
                    return true;
                }
                false
            }
        }
    }

    /// Poll the file on a fixed interval until the store is dropped.
    pub fn watch(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.poll().await;
            }
        })
    }
}

#[async_trait]
impl SharedDocumentStore for FileStore {
    async fn is_ready(&self) -> bool {
        self.read_document().await.is_ok()
    }

    async fn get(&self) -> Result<Metadata> {
        Ok(self.read_document().await?.0)
    }

    async fn set(&self, patch: Metadata) -> Result<()> {
        self.update(Box::new(move |_: &Metadata| Ok(patch))).await
    }

    async fn update(&self, apply: DocumentUpdate) -> Result<()> {
        let mut state = self.state.lock().await;

        let (mut document, _) = self.read_document().await?;
        let patch = apply(&document)?;
        for (key, value) in patch {
            document.insert(key, value);
        }

        let raw = serde_json::to_string_pretty(&document)?;
        self.write_raw(raw.clone()).await?;

        state.last_seen = Some(raw);
        state.ready = true;
        drop(state);

        let _ = self.events.send(StoreEvent::DocumentChanged);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.events.subscribe())
    }
}
