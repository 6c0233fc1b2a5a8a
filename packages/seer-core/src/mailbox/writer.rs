//! Applies mailbox operations against a live store.

use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use super::document::ChatDocument;
use super::ids::MessageIdGenerator;
use super::model::{append_message, clear_all, extract_outbox};
use crate::session::SessionContext;
use crate::store::{Metadata, SharedDocumentStore};
use crate::types::{Message, ParticipantId};
use crate::{now_millis, Error, Result};

/// Input that clears every outbox when sent by the privileged role.
pub const CLEAR_COMMAND: &str = "/clearchat";

/// What a submitted line turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Appended to this participant's outbox
    Posted(Message),
    /// Every outbox was emptied
    Cleared,
    /// Blank input; nothing written
    Ignored,
}

/// Writer for the local participant's outbox.
///
/// Writes from one mailbox run one at a time. Each is applied through
/// [`SharedDocumentStore::update`] against the latest document and writes the
/// chat namespace back with a fresh last-modified stamp.
pub struct Mailbox {
    store: Arc<dyn SharedDocumentStore>,
    session: RwLock<SessionContext>,
    ids: MessageIdGenerator,
    write_lock: Mutex<()>,
}

impl Mailbox {
    pub fn new(store: Arc<dyn SharedDocumentStore>, session: SessionContext) -> Self {
        Self {
            store,
            session: RwLock::new(session),
            ids: MessageIdGenerator::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the session context.
    pub fn session(&self) -> SessionContext {
        match self.session.read() {
            Ok(session) => session.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn identity(&self) -> ParticipantId {
        self.session().identity
    }

    /// Apply a display-name update from the host.
    pub fn set_display_name(&self, name: &str) {
        let mut session = match self.session.write() {
            Ok(session) => session,
            Err(poisoned) => poisoned.into_inner(),
        };
        session.display_name = name.to_string();
    }

    /// Read the chat namespace as it is in the store right now.
    pub async fn current_document(&self) -> Result<ChatDocument> {
        if !self.store.is_ready().await {
            return Err(Error::SessionNotReady);
        }
        let metadata = self.store.get().await?;
        Ok(ChatDocument::from_metadata(&metadata))
    }

    /// This participant's outbox as stored right now.
    pub async fn outbox(&self) -> Result<Vec<Message>> {
        let document = self.current_document().await?;
        Ok(extract_outbox(&document, &self.identity()))
    }

    /// Handle one line from the chat input box.
    ///
    /// The clear command is only special for the privileged role; anyone else
    /// posts it as ordinary text.
    pub async fn submit(&self, text: &str) -> Result<Submission> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Submission::Ignored);
        }

        let session = self.session();
        if session.is_privileged() && text == CLEAR_COMMAND {
            self.clear_all().await?;
            return Ok(Submission::Cleared);
        }

        self.post_as(&session.author_label(), text, None).await
    }

    /// Append a message with an explicit sender label to this participant's
    /// outbox.
    pub async fn post_as(
        &self,
        sender: &str,
        body: &str,
        rendered_body: Option<String>,
    ) -> Result<Submission> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(Submission::Ignored);
        }

        let _guard = self.write_lock.lock().await;
        if !self.store.is_ready().await {
            return Err(Error::SessionNotReady);
        }

        let identity = self.identity();
        let mut message = Message::new(self.ids.next_id(), sender, body);
        message.rendered_body = rendered_body;

        let author = identity.clone();
        let appended = message.clone();
        self.store
            .update(Box::new(move |current: &Metadata| {
                let document = ChatDocument::from_metadata(current);
                append_message(&document, &author, appended).to_patch(now_millis())
            }))
            .await?;

        tracing::debug!("Posted message {} to outbox {}", message.id, identity);
        Ok(Submission::Posted(message))
    }

    /// Empty every participant's outbox. Privileged role only.
    ///
    /// Overwrites the whole chat namespace, so an append from another process
    /// racing with the clear may be lost.
    pub async fn clear_all(&self) -> Result<()> {
        if !self.session().is_privileged() {
            return Err(Error::InvalidOperation(
                "Only the GM can clear the chat".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        if !self.store.is_ready().await {
            return Err(Error::SessionNotReady);
        }

        self.store
            .update(Box::new(|current: &Metadata| {
                let document = ChatDocument::from_metadata(current);
                let cleared = clear_all(&document);
                tracing::info!("Cleared {} outboxes", cleared.len());
                cleared.to_patch(now_millis())
            }))
            .await
    }
}
